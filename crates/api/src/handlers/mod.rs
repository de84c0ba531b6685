pub mod chart;
pub mod health;

use crate::AppState;
