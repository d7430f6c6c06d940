#![allow(dead_code)]

pub mod forms;
pub mod sessions;
