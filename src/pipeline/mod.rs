pub mod record;
pub mod safety; // Content safety validation for generated interpretations
