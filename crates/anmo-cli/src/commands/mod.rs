pub mod select;
pub mod springs;
pub mod traj;
