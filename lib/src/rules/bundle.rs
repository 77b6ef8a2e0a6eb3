use super::RuleError;

/// Replacement identity for an OSGi bundle
///
/// Written as `symbolic-name,version,name,description`. The name and description can be prefixed
/// with `+` to mean "append to the existing value" rather than "replace the existing value", and
/// either may be quoted:
///
/// ```text
/// com.acme.web.jakarta,2.0,+" Jakarta",+"; Jakarta Enabled"
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleIdentity {
    pub symbolic_name: String,
    pub version: String,
    pub name: String,
    pub add_name: bool,
    pub description: String,
    pub add_description: bool,
}

impl BundleIdentity {
    pub fn parse(text: &str) -> Result<BundleIdentity, RuleError> {
        let malformed = || RuleError::MalformedBundle(text.to_owned());

        let mut parts = text.splitn(4, ',').map(str::trim);
        let mut next = || parts.next().filter(|part| !part.is_empty()).ok_or_else(malformed);
        let symbolic_name = next()?.to_owned();
        let version = next()?.to_owned();
        let name = next()?;
        let description = next()?;

        let (add_name, name) = additive(name);
        let (add_description, description) = additive(description);
        Ok(BundleIdentity {
            symbolic_name,
            version,
            name: unquote(name).ok_or_else(malformed)?.to_owned(),
            add_name,
            description: unquote(description).ok_or_else(malformed)?.to_owned(),
            add_description,
        })
    }

    /// New bundle name, given the current one
    pub fn updated_name(&self, initial: &str) -> String {
        if self.add_name {
            format!("{}{}", initial, self.name)
        } else {
            self.name.clone()
        }
    }

    /// New bundle description, given the current one
    pub fn updated_description(&self, initial: &str) -> String {
        if self.add_description {
            format!("{}{}", initial, self.description)
        } else {
            self.description.clone()
        }
    }
}

fn additive(value: &str) -> (bool, &str) {
    match value.strip_prefix('+') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, value),
    }
}

/// Strip surrounding double quotes, if there are any
fn unquote(value: &str) -> Option<&str> {
    match value.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"'),
        None if value.ends_with('"') => None,
        None => Some(value),
    }
}
