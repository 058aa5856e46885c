// Path Planning algorithms module

pub mod a_star;
pub mod cubic_spline_planner;
pub mod path_smoothing;
pub mod roadmap;

pub use a_star::*;
pub use cubic_spline_planner::*;
pub use path_smoothing::*;
pub use roadmap::*;
