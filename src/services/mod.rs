// src/services/mod.rs

pub mod catalog;
pub mod leaderboard;
pub mod quiz_generator;
pub mod quiz_grader;
pub mod stats;
