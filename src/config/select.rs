use super::types::AppIdentity;

/// Choose which app to authenticate as.
///
/// A requested id that matches nothing falls back to the default selection
/// instead of failing. Default selection is the first app flagged `default`,
/// or the first app in configuration order. Returns `None` only for an empty
/// list.
pub fn select_app<'a>(apps: &'a [AppIdentity], requested: Option<&str>) -> Option<&'a AppIdentity> {
    let requested = requested.filter(|r| !r.is_empty());
    if let Some(key) = requested {
        if let Some(app) = apps.iter().find(|a| a.id == key) {
            return Some(app);
        }
        tracing::debug!(app = key, "requested app is not configured, using the default");
    }
    apps.iter().find(|a| a.is_default).or_else(|| apps.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apps() -> Vec<AppIdentity> {
        vec![
            AppIdentity::new("a", "client-a"),
            AppIdentity::new("b", "client-b").with_default(true),
        ]
    }

    #[test]
    fn empty_request_picks_default() {
        let apps = apps();
        assert_eq!(select_app(&apps, None).unwrap().id, "b");
        assert_eq!(select_app(&apps, Some("")).unwrap().id, "b");
    }

    #[test]
    fn matching_request_wins_over_default() {
        let apps = apps();
        assert_eq!(select_app(&apps, Some("a")).unwrap().id, "a");
    }

    #[test]
    fn unknown_request_falls_back_to_default() {
        let apps = apps();
        assert_eq!(select_app(&apps, Some("missing")).unwrap().id, "b");
    }

    #[test]
    fn no_default_picks_first() {
        let apps = vec![AppIdentity::new("x", "cx"), AppIdentity::new("y", "cy")];
        assert_eq!(select_app(&apps, None).unwrap().id, "x");
        assert_eq!(select_app(&apps, Some("nope")).unwrap().id, "x");
    }

    #[test]
    fn first_of_several_defaults_wins() {
        let apps = vec![
            AppIdentity::new("x", "cx"),
            AppIdentity::new("y", "cy").with_default(true),
            AppIdentity::new("z", "cz").with_default(true),
        ];
        assert_eq!(select_app(&apps, None).unwrap().id, "y");
    }

    #[test]
    fn empty_list_selects_nothing() {
        assert!(select_app(&[], Some("a")).is_none());
        assert!(select_app(&[], None).is_none());
    }
}
