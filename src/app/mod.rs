// Application layer: the concrete pipelines wired from core pieces.

pub mod pipelines;
