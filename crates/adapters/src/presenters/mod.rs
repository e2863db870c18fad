use photo_grid_domain::{CellRect, DataUri};

pub fn present_saved_row(index: usize, image: &DataUri) -> String {
    format!("{}\t{}\t{} bytes", index, image.mime_type(), image.len())
}

pub fn present_active(image: Option<&DataUri>) -> String {
    match image {
        Some(image) => format!("active image: {} ({} bytes)", image.mime_type(), image.len()),
        None => "no active image".to_string(),
    }
}

pub fn present_cell_row(index: usize, cols: u32, cell: &CellRect) -> String {
    let cols = cols.max(1) as usize;
    format!(
        "r{}c{}\tleft={} top={} width={} height={}",
        index / cols,
        index % cols,
        cell.left,
        cell.top,
        cell.width,
        cell.height
    )
}
