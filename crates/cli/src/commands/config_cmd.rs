//! `sift config`: print the default or effective configuration.

use sift_config::AppConfig;

pub fn run(config: &AppConfig, show: bool) {
    if show {
        println!("# {}", AppConfig::config_dir().join("config.toml").display());
        println!("{config:#?}");
    } else {
        print!("{}", AppConfig::default_toml());
    }
}
