use std::env;
use std::path::PathBuf;

/// `.env` files tried after the working directory, most specific first.
fn dotenv_candidates(
    explicit: Option<PathBuf>,
    selfos_home: Option<PathBuf>,
    home_dir: Option<PathBuf>,
) -> Vec<PathBuf> {
    let mut out = Vec::new();
    out.extend(explicit);
    match selfos_home {
        Some(root) => out.push(root.join(".env")),
        None => out.extend(home_dir.map(|home| home.join("SelfOS/.env"))),
    }
    out
}

pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let candidates = dotenv_candidates(
        env::var_os("SELFOS_ENV_FILE").map(PathBuf::from),
        env::var_os("SELFOS_HOME").map(PathBuf::from),
        dirs::home_dir(),
    );
    for path in candidates {
        if path.is_file() && dotenvy::from_path(&path).is_ok() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::dotenv_candidates;
    use std::path::PathBuf;

    #[test]
    fn selfos_home_replaces_user_home_fallback() {
        let got = dotenv_candidates(
            None,
            Some(PathBuf::from("/workspace/selfos")),
            Some(PathBuf::from("/home/dev")),
        );
        assert_eq!(got, vec![PathBuf::from("/workspace/selfos/.env")]);
    }

    #[test]
    fn user_home_used_when_selfos_home_unset() {
        let got = dotenv_candidates(None, None, Some(PathBuf::from("/home/dev")));
        assert_eq!(got, vec![PathBuf::from("/home/dev/SelfOS/.env")]);
    }

    #[test]
    fn explicit_env_file_is_tried_first() {
        let got = dotenv_candidates(
            Some(PathBuf::from("/etc/selfos.env")),
            None,
            Some(PathBuf::from("/home/dev")),
        );
        assert_eq!(
            got,
            vec![
                PathBuf::from("/etc/selfos.env"),
                PathBuf::from("/home/dev/SelfOS/.env")
            ]
        );
    }
}
