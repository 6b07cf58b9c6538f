use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    /// Idle client timeout in seconds. 0 disables the timeout.
    pub timeout: u64,
    pub loglevel: String,
    /// Popcount kernel selection: "auto" picks the fastest path the CPU
    /// supports, "scalar" forces the lookup-table oracle.
    pub popcount: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: "127.0.0.1".to_string(),
            port: 6379,
            timeout: 0,
            loglevel: "notice".to_string(),
            popcount: "auto".to_string(),
        }
    }
}

impl Config {
    pub fn from_args(args: &[String]) -> Self {
        let mut config = Config::default();
        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--bind" => {
                    if i + 1 < args.len() {
                        config.bind = args[i + 1].clone();
                        i += 1;
                    }
                }
                "--port" => {
                    if i + 1 < args.len() {
                        if let Ok(p) = args[i + 1].parse() {
                            config.port = p;
                        }
                        i += 1;
                    }
                }
                "--timeout" => {
                    if i + 1 < args.len() {
                        if let Ok(t) = args[i + 1].parse() {
                            config.timeout = t;
                        }
                        i += 1;
                    }
                }
                "--loglevel" => {
                    if i + 1 < args.len() {
                        config.loglevel = args[i + 1].clone();
                        i += 1;
                    }
                }
                "--popcount" => {
                    if i + 1 < args.len() {
                        config.popcount = args[i + 1].clone();
                        i += 1;
                    }
                }
                other => {
                    eprintln!("Ignoring unknown argument: {other}");
                }
            }
            i += 1;
        }
        config
    }
}

pub type SharedConfig = Arc<Config>;
