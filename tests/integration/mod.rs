mod activity;
mod monitor;
