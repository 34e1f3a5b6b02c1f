//! FFmpeg video filter definitions.

/// Label for the scaled/padded frame inside a filter graph.
const BASE_LABEL: &str = "base";
/// Label for the final video stream of the edit graph.
pub const VIDEO_OUT_LABEL: &str = "vout";

/// Fit into `width`x`height`, pad to center, reset sample aspect ratio to 1:1.
pub fn scale_pad_filter(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1",
        w = width,
        h = height
    )
}

/// Overlay placed `margin` pixels from the right and bottom edges.
pub fn overlay_bottom_right(margin: u32) -> String {
    format!("overlay=W-w-{m}:H-h-{m}", m = margin)
}

/// Video filtering for the edit pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditFilter {
    /// Single-input chain, passed with `-vf`.
    Simple(String),
    /// Two-input graph, passed with `-filter_complex` and mapped by label.
    Complex { graph: String, output_label: String },
}

/// Build the edit-pass filter.
///
/// With a watermark, input 0 is the source and input 1 the watermark image,
/// composited at native size on top of the scaled frame.
pub fn build_edit_filter(width: u32, height: u32, watermark_margin: Option<u32>) -> EditFilter {
    let scale_pad = scale_pad_filter(width, height);

    match watermark_margin {
        None => EditFilter::Simple(scale_pad),
        Some(margin) => EditFilter::Complex {
            graph: format!(
                "[0:v]{scale_pad}[{base}];[{base}][1:v]{overlay}[{out}]",
                base = BASE_LABEL,
                overlay = overlay_bottom_right(margin),
                out = VIDEO_OUT_LABEL
            ),
            output_label: format!("[{}]", VIDEO_OUT_LABEL),
        },
    }
}
