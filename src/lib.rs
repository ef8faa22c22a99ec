#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate serde_derive;

pub mod classify;
pub mod cli;
pub mod config;
pub mod models;

pub const AUTHOR_AND_EMAIL: &str =
    "Rhys J. P. Newell, Centre for Microbiome Research, School of Biomedical Sciences, Faculty of Health, Queensland University of Technology <rhys.newell94 near gmail.com>";
