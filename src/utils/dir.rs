use std::{env, io, path::PathBuf};

use anyhow::Result;

pub fn create_application_default_path() -> Result<PathBuf> {
    let path = {
        cfg_if::cfg_if! {
            if #[cfg(windows)] {
                let mut path =
                    PathBuf::from(env::var("APPDATA").expect("APPDATA should be present on Windows"));
                path.push("focusduck");
                path
            } else {
                let mut path = env::var("XDG_STATE_HOME")
                    .map(PathBuf::from)
                    .or_else(|_| {
                        env::var("HOME").map(|home| {
                            let mut path = PathBuf::from(home);
                            path.push(".local/state");
                            path
                        })
                    })
                    .expect("Couldn't find neither XDG_STATE_HOME nor HOME");
                path.push("focusduck");
                path
            }
        }
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

/// Location of the persistent key-value store inside the application
/// directory. The daemon writes it, `focusduck report`/`summary` read it.
pub fn store_path(app_dir: &std::path::Path) -> PathBuf {
    app_dir.join("state.json")
}
