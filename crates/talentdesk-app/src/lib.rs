// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod analytics;
pub mod catalog;
pub mod cells;
pub mod detail;
pub mod forms;
pub mod ids;
pub mod model;
pub mod projection;
pub mod state;

pub use catalog::*;
pub use cells::*;
pub use detail::*;
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use projection::*;
pub use state::*;
