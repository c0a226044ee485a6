use serde_json::Value;
use std::collections::HashSet;

/// Topic category a message body is interpreted with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processor {
    /// koji build system
    Buildsys,
    /// dist-git pushes
    Git,
    /// package database ACL/ownership changes
    Pkgdb,
    /// bodhi updates
    Bodhi,
    Generic,
}

impl Processor {
    /// Picks the processor from the first topic segment naming a known category
    /// (e.g. `org.fedoraproject.prod.buildsys.build.state.change` -> `Buildsys`)
    pub fn for_topic(topic: &str) -> Self {
        topic
            .split('.')
            .find_map(|segment| match segment {
                "buildsys" => Some(Processor::Buildsys),
                "git" => Some(Processor::Git),
                "pkgdb" => Some(Processor::Pkgdb),
                "bodhi" => Some(Processor::Bodhi),
                _ => None,
            })
            .unwrap_or(Processor::Generic)
    }

    pub fn usernames(self, msg: &Value) -> HashSet<String> {
        let paths: &[&[&str]] = match self {
            Processor::Buildsys => &[&["owner"]],
            Processor::Git => &[&["commit", "username"], &["commit", "agent"]],
            Processor::Pkgdb => &[&["agent"]],
            Processor::Bodhi => &[
                &["agent"],
                &["update", "user", "name"],
                &["comment", "user", "name"],
            ],
            Processor::Generic => &[&["agent"], &["user"], &["username"], &["owner"]],
        };
        collect_strings(msg, paths)
    }

    pub fn packages(self, msg: &Value) -> HashSet<String> {
        match self {
            Processor::Buildsys => collect_strings(msg, &[&["name"]]),
            Processor::Git => collect_strings(msg, &[&["commit", "repo"]]),
            Processor::Pkgdb => collect_strings(
                msg,
                &[
                    &["package_listing", "package", "name"],
                    &["package_name"],
                    &["package", "name"],
                ],
            ),
            Processor::Bodhi => bodhi_packages(msg),
            Processor::Generic => HashSet::new(),
        }
    }
}

/// Looks up a string at a nested object path
fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |current, key| current.get(*key))
        .and_then(Value::as_str)
}

fn collect_strings(msg: &Value, paths: &[&[&str]]) -> HashSet<String> {
    paths
        .iter()
        .filter_map(|path| str_at(msg, path))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn bodhi_packages(msg: &Value) -> HashSet<String> {
    msg.get("update")
        .and_then(|update| update.get("builds"))
        .and_then(Value::as_array)
        .map(|builds| {
            builds
                .iter()
                .filter_map(|build| build.get("nvr").and_then(Value::as_str))
                .filter_map(package_from_nvr)
                .collect()
        })
        .unwrap_or_default()
}

/// `kernel-6.5.0-1.fc39` -> `kernel`
fn package_from_nvr(nvr: &str) -> Option<String> {
    let mut parts = nvr.rsplitn(3, '-');
    let _release = parts.next()?;
    let _version = parts.next()?;
    parts
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_for_topic() {
        assert_eq!(
            Processor::for_topic("org.fedoraproject.prod.buildsys.build.state.change"),
            Processor::Buildsys
        );
        assert_eq!(
            Processor::for_topic("org.fedoraproject.prod.git.receive"),
            Processor::Git
        );
        assert_eq!(
            Processor::for_topic("org.fedoraproject.prod.pkgdb.acl.update"),
            Processor::Pkgdb
        );
        assert_eq!(
            Processor::for_topic("org.fedoraproject.prod.bodhi.update.comment"),
            Processor::Bodhi
        );
        assert_eq!(
            Processor::for_topic("org.fedoraproject.prod.wiki.article.edit"),
            Processor::Generic
        );
    }

    #[test]
    fn test_buildsys() {
        let msg = json!({"owner": "alice", "name": "kernel", "version": "6.5.0"});
        assert_eq!(Processor::Buildsys.usernames(&msg), set(&["alice"]));
        assert_eq!(Processor::Buildsys.packages(&msg), set(&["kernel"]));
    }

    #[test]
    fn test_git() {
        let msg = json!({
            "commit": {"username": "bob", "agent": "carol", "repo": "glibc", "branch": "rawhide"}
        });
        assert_eq!(Processor::Git.usernames(&msg), set(&["bob", "carol"]));
        assert_eq!(Processor::Git.packages(&msg), set(&["glibc"]));
    }

    #[test]
    fn test_pkgdb() {
        let msg = json!({
            "agent": "dave",
            "package_listing": {"package": {"name": "python3"}}
        });
        assert_eq!(Processor::Pkgdb.usernames(&msg), set(&["dave"]));
        assert_eq!(Processor::Pkgdb.packages(&msg), set(&["python3"]));
    }

    #[test]
    fn test_bodhi() {
        let msg = json!({
            "agent": "erin",
            "update": {
                "user": {"name": "frank"},
                "builds": [
                    {"nvr": "kernel-6.5.0-1.fc39"},
                    {"nvr": "kernel-headers-6.5.0-1.fc39"},
                    {"nvr": "bogus"}
                ]
            }
        });
        assert_eq!(Processor::Bodhi.usernames(&msg), set(&["erin", "frank"]));
        assert_eq!(
            Processor::Bodhi.packages(&msg),
            set(&["kernel", "kernel-headers"])
        );
    }

    #[test]
    fn test_missing_or_mistyped_fields_are_ignored() {
        let msg = json!({"owner": 7, "name": null, "commit": "not-an-object"});
        assert!(Processor::Buildsys.usernames(&msg).is_empty());
        assert!(Processor::Buildsys.packages(&msg).is_empty());
        assert!(Processor::Git.usernames(&msg).is_empty());
        assert!(Processor::Bodhi.packages(&json!([])).is_empty());
    }

    #[test]
    fn test_package_from_nvr() {
        assert_eq!(package_from_nvr("glibc-2.38-6.fc39"), Some("glibc".to_string()));
        assert_eq!(package_from_nvr("2.38-6"), None);
        assert_eq!(package_from_nvr("-1-2"), None);
    }
}
