// src/models/mod.rs

pub mod leaderboard;
pub mod question;
pub mod quiz;
pub mod score;
pub mod subject;
