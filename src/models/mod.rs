mod announcement;
mod route;

pub use announcement::Announcement;
pub use route::RouteUpdate;
