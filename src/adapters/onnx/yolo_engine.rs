use anyhow::{bail, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::{s, Array4, ArrayViewD, Axis, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Tensor;
use std::fs;

use crate::domain::detection::Detection;
use crate::domain::model::YoloParams;

pub struct OnnxYoloEngine {
    session: Session,
}

impl OnnxYoloEngine {
    pub fn load(path: &str) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(4)?;

        // CUDA es opcional: si está disponible se registra, si no continuamos en CPU.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;

        Ok(Self { session })
    }

    /// Devuelve las detecciones del modelo tras su propio umbral y NMS por clase,
    /// ordenadas por score descendente. No aplica el umbral de negocio.
    pub fn infer(&mut self, rgb: &RgbImage, params: &YoloParams) -> Result<Vec<Detection>> {
        let imgsz = params.input_size as usize;
        let resized = image::imageops::resize(rgb, imgsz as u32, imgsz as u32, FilterType::Triangle);

        let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
        for (x, y, pixel) in resized.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let (raw, _offset) = input.into_raw_vec_and_offset();
        let input_tensor = Tensor::from_array((input_shape, raw))?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
        if dims.len() != 3 || dims[1] <= 4 {
            bail!("salida YOLO inesperada: {:?}", dims);
        }
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        let view = array_view.index_axis(Axis(0), 0);

        let num_candidates = view.shape()[1];
        let sx = rgb.width() as f32 / imgsz as f32;
        let sy = rgb.height() as f32 / imgsz as f32;
        let (max_x, max_y) = (rgb.width() as f32, rgb.height() as f32);

        let mut candidates = Vec::new();

        for i in 0..num_candidates {
            let scores = view.slice(s![4.., i]);
            let Some((class_id, &max_score)) = scores
                .indexed_iter()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
            else {
                continue;
            };

            if max_score >= params.conf_threshold {
                let cx = view[[0, i]];
                let cy = view[[1, i]];
                let w = view[[2, i]];
                let h = view[[3, i]];

                candidates.push(Detection {
                    x1: ((cx - w / 2.0) * sx).clamp(0.0, max_x),
                    y1: ((cy - h / 2.0) * sy).clamp(0.0, max_y),
                    x2: ((cx + w / 2.0) * sx).clamp(0.0, max_x),
                    y2: ((cy + h / 2.0) * sy).clamp(0.0, max_y),
                    score: max_score.clamp(0.0, 1.0),
                    class_id,
                });
            }
        }

        Ok(class_nms(candidates, params.iou_threshold, params.max_detections))
    }
}

/// NMS por clase: solo se suprimen cajas de la misma clase que solapan más de `iou`.
pub fn class_nms(mut candidates: Vec<Detection>, iou: f32, max_detections: usize) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Detection> = Vec::new();
    for det in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == det.class_id && k.iou(&det) > iou);
        if !suppressed {
            kept.push(det);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x: f32, score: f32, class_id: usize) -> Detection {
        Detection { x1: x, y1: 0.0, x2: x + 10.0, y2: 10.0, score, class_id }
    }

    #[test]
    fn nms_suppresses_overlaps_of_same_class_only() {
        let out = class_nms(
            vec![det(0.0, 0.6, 0), det(1.0, 0.9, 0), det(1.0, 0.8, 1), det(50.0, 0.4, 0)],
            0.45,
            300,
        );
        let kept: Vec<(usize, f32)> = out.iter().map(|d| (d.class_id, d.score)).collect();
        assert_eq!(kept, vec![(0, 0.9), (1, 0.8), (0, 0.4)]);
    }

    #[test]
    fn nms_respects_max_detections() {
        let out = class_nms((0..10).map(|i| det(i as f32 * 20.0, 0.5, 0)).collect(), 0.45, 3);
        assert_eq!(out.len(), 3);
    }
}
