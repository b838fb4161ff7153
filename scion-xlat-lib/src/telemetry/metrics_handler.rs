use prometheus::{Encoder, TextEncoder};

/// Render the current metric families as Prometheus text exposition
/// format, along with its content type.
pub fn render_metrics(registry: &prometheus::Registry) -> Result<(String, String), std::fmt::Error> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    // TextEncoder::encode only fails on a broken writer; an in-memory
    // Vec never returns an error, so this unwrap cannot panic in
    // practice - but surface it as a formatted error rather than
    // panicking if that ever changes upstream.
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return Err(std::fmt::Error);
    }
    let body = String::from_utf8_lossy(&buffer).into_owned();
    Ok((body, encoder.format_type().to_string()))
}
