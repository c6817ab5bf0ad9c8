// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod filter;
pub mod forms;
pub mod ids;
pub mod model;
pub mod ports;
pub mod refresh;
pub mod sort;
pub mod view;

pub use filter::*;
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use ports::*;
pub use refresh::*;
pub use sort::*;
pub use view::*;
