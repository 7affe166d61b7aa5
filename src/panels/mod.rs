mod admin_panel;
mod central_panel;
mod notes_panel;
mod team_list;
mod tools_panel;
mod top_bar;

pub use admin_panel::{AdminState, admin_window};
pub use central_panel::central_panel;
pub use notes_panel::notes_panel;
pub use team_list::team_list;
pub use tools_panel::tools_panel;
pub use top_bar::top_bar;
