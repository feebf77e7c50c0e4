//! Métricas de clasificación sobre un dominio fijo de etiquetas.
//!
//! Las métricas por clase se agregan ponderando por el soporte (número de
//! apariciones en la referencia). Cualquier división por cero vale 0.

use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

use super::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub labels: Vec<String>,
    /// Filas = referencia, columnas = predicción.
    pub confusion_matrix: Vec<Vec<u32>>,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}

pub fn score<L>(predicted: &[L], reference: &[L], label_domain: &[L]) -> DomainResult<Option<EvaluationResult>>
where
    L: Copy + Eq + Hash + std::fmt::Display,
{
    if predicted.is_empty() && reference.is_empty() {
        return Ok(None);
    }
    if predicted.len() != reference.len() {
        return Err(DomainError::LabelLengthMismatch {
            predicted: predicted.len(),
            reference: reference.len(),
        });
    }

    let index: HashMap<L, usize> = label_domain.iter().enumerate().map(|(i, l)| (*l, i)).collect();
    let position = |l: &L| {
        index
            .get(l)
            .copied()
            .ok_or_else(|| DomainError::UnknownLabel(l.to_string()))
    };

    let k = label_domain.len();
    let mut matrix = vec![vec![0u32; k]; k];
    for (p, r) in predicted.iter().zip(reference) {
        matrix[position(r)?][position(p)?] += 1;
    }

    let n = predicted.len() as f64;
    let correct: u32 = (0..k).map(|i| matrix[i][i]).sum();

    let (mut precision, mut recall, mut f1) = (0.0, 0.0, 0.0);
    for c in 0..k {
        let tp = matrix[c][c] as f64;
        let support: u32 = matrix[c].iter().sum();
        let predicted_c: u32 = matrix.iter().map(|row| row[c]).sum();
        if support == 0 {
            continue;
        }
        let p = ratio(tp, predicted_c as f64);
        let r = ratio(tp, support as f64);
        let f = ratio(2.0 * p * r, p + r);
        let w = support as f64 / n;
        precision += w * p;
        recall += w * r;
        f1 += w * f;
    }

    Ok(Some(EvaluationResult {
        labels: label_domain.iter().map(|l| l.to_string()).collect(),
        confusion_matrix: matrix,
        accuracy: correct as f64 / n,
        precision,
        recall,
        f1_score: f1,
        support: predicted.len(),
    }))
}
