// all black-box tests live in one binary: a single link step instead of one
// per file
mod health_check;
mod helpers;
mod popup_settings;
mod refresh_list;
