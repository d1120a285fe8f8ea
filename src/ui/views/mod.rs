mod character_detail;
mod character_list;

pub use character_detail::draw_character_detail;
pub use character_list::draw_character_list;
