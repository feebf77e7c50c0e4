pub mod http;
pub mod onnx;
pub mod pricing;
pub mod sqlite;
