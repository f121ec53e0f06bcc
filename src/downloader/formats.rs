// Format listing helpers
//
// Turns yt-dlp's raw `formats` array into descriptors and renders the table
// shown before the video format prompt.

use super::models::{FormatDescriptor, RawFormat};
use crate::console::{paint, print_colored, Color};

pub fn build_descriptors(raw: Vec<RawFormat>) -> Vec<FormatDescriptor> {
    raw.into_iter().map(FormatDescriptor::from).collect()
}

/// `<id> - <note> - <resolution>p - <ext> (<type>)`
pub fn format_row(desc: &FormatDescriptor) -> String {
    format!(
        "{} - {} - {}p - {} ({})",
        paint(&desc.id, Color::Green),
        desc.note,
        desc.resolution_label(),
        desc.extension,
        desc.kind
    )
}

pub fn print_format_table(formats: &[FormatDescriptor]) {
    print_colored("Available formats:", Color::Cyan);
    for desc in formats {
        println!("{}", format_row(desc));
    }
}

/// True if `id` names one of the listed formats, or combines listed ones with `+`
pub fn is_known_format(formats: &[FormatDescriptor], id: &str) -> bool {
    let id = id.trim();
    !id.is_empty()
        && id
            .split('+')
            .all(|part| formats.iter().any(|f| f.id == part))
}
