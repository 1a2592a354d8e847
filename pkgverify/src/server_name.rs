use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerNameError {
    #[error("server name is required")]
    Required,

    #[error("server name cannot contain multiple slashes: '{0}'")]
    MultipleSlashes(String),

    #[error(
        "server name must be in format 'dns-namespace/name' with non-empty namespace and name parts: '{0}'"
    )]
    InvalidFormat(String),
}

/// Check that a claimed owner has the `namespace/name` shape.
pub fn validate_server_name(name: &str) -> Result<(), ServerNameError> {
    if name.is_empty() {
        return Err(ServerNameError::Required);
    }

    match name.split('/').collect::<Vec<_>>().as_slice() {
        [namespace, server] if !namespace.trim().is_empty() && !server.trim().is_empty() => Ok(()),
        [_, _] | [_] => Err(ServerNameError::InvalidFormat(name.to_string())),
        _ => Err(ServerNameError::MultipleSlashes(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_slash_names() {
        for name in [
            "com.example/server",
            "com.company.department.team/project",
            "org.nonprofit/my-cool-server",
            "com.example/my_server_name",
            "@scope/package",
            "a/b",
        ] {
            assert_eq!(validate_server_name(name), Ok(()), "{}", name);
        }
    }

    #[test]
    fn test_multiple_slashes() {
        for name in [
            "com.example/server/extra",
            "com.example//server",
            "com.example/server/",
            "github.com/user/repo",
            "https://example.com/path",
            "///",
        ] {
            assert_eq!(
                validate_server_name(name),
                Err(ServerNameError::MultipleSlashes(name.to_string())),
                "{}",
                name
            );
        }
        let err = validate_server_name("com.example/server/extra/path").unwrap_err();
        assert!(err.to_string().contains("com.example/server/extra/path"));
    }

    #[test]
    fn test_missing_parts() {
        assert_eq!(validate_server_name(""), Err(ServerNameError::Required));
        for name in ["/", " /server", "com.example/ ", "com.example.server"] {
            let err = validate_server_name(name).unwrap_err();
            assert_eq!(err, ServerNameError::InvalidFormat(name.to_string()));
            assert!(err.to_string().contains("non-empty namespace and name parts"));
        }
    }

    #[test]
    fn test_slash_counts() {
        for count in 0..=10 {
            let name = if count == 0 {
                "com.example.server".to_string()
            } else {
                (0..=count)
                    .map(|i| format!("part{}", i))
                    .collect::<Vec<_>>()
                    .join("/")
            };
            assert_eq!(validate_server_name(&name).is_ok(), count == 1, "{}", name);
        }
    }
}
