mod header;
mod utils;

pub use header::draw_header;
pub use utils::{centered_rect, notice_line, page_bar, status_color};
