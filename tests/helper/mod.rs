#![allow(dead_code)]

pub mod forge;
pub mod repo;
