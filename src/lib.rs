//! Backend de inspección de daños en vehículos: detección YOLO, agregación por
//! tipo de daño, métricas, render anotado y persistencia transaccional.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
