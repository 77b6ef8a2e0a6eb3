//! Rename rules
//!
//! A [`RuleTable`] holds everything that decides whether and how a name changes. It is built once,
//! up front, and is read-only afterwards so it can be shared between threads transforming
//! different class files.

mod boundary;
mod bundle;
mod errors;

pub use boundary::*;
pub use bundle::*;
pub use errors::*;

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

/// Which separator a package or class name uses
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum NameForm {
    /// Java source form: `javax.servlet`
    Dotted,

    /// JVM internal form: `javax/servlet`
    Binary,
}

impl NameForm {
    pub const fn separator(self) -> char {
        match self {
            NameForm::Dotted => '.',
            NameForm::Binary => '/',
        }
    }
}

/// Package rename, stored without its wildcard suffix
#[derive(Clone, PartialEq, Eq, Debug)]
struct Rule {
    key: String,
    replacement: String,

    /// Key also matches any sub-package
    wildcard: bool,
}

/// All the renames, in one of the two name forms
#[derive(Clone, Default, Debug)]
struct Renames {
    exact: HashMap<String, String>,

    /// Wildcard rules, longest key first
    wildcards: Vec<Rule>,

    /// Every rule, longest key first
    by_length: Vec<Rule>,
}

impl Renames {
    fn new(rules: &[Rule], form: NameForm) -> Renames {
        let mut rules: Vec<Rule> = rules
            .iter()
            .map(|rule| Rule {
                key: rule.key.replace('.', &form.separator().to_string()),
                replacement: rule.replacement.replace('.', &form.separator().to_string()),
                wildcard: rule.wildcard,
            })
            .collect();
        rules.sort_by(|a, b| b.key.len().cmp(&a.key.len()).then_with(|| a.key.cmp(&b.key)));

        Renames {
            exact: rules
                .iter()
                .filter(|rule| !rule.wildcard)
                .map(|rule| (rule.key.clone(), rule.replacement.clone()))
                .collect(),
            wildcards: rules.iter().filter(|rule| rule.wildcard).cloned().collect(),
            by_length: rules,
        }
    }
}

/// Immutable table of renames
///
/// ```
/// use jarshift::rules::{NameForm, RuleTable};
///
/// let rules = RuleTable::builder()
///     .rename("javax.servlet", "jakarta.servlet")
///     .rename("javax.ejb.*", "jakarta.ejb")
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     rules.rename("javax/servlet", NameForm::Binary).as_deref(),
///     Some("jakarta/servlet"),
/// );
/// assert_eq!(rules.rename("javax.servlet.http", NameForm::Dotted), None);
/// assert_eq!(
///     rules.rename("javax.ejb.spi", NameForm::Dotted).as_deref(),
///     Some("jakarta.ejb.spi"),
/// );
/// ```
#[derive(Clone, Debug)]
pub struct RuleTable {
    rules: Vec<Rule>,
    dotted: Renames,
    binary: Renames,

    /// Version ranges, keyed by the new (dotted) package name
    versions: HashMap<String, String>,

    /// Bundle identity updates, keyed by the old symbolic name
    bundles: HashMap<String, BundleIdentity>,

    /// Exact full-string replacements
    direct: HashMap<String, String>,
}

impl Default for RuleTable {
    fn default() -> Self {
        RuleTable::empty()
    }
}

impl RuleTable {
    /// Table without any rules: nothing is ever renamed
    pub fn empty() -> RuleTable {
        RuleTable {
            rules: vec![],
            dotted: Renames::default(),
            binary: Renames::default(),
            versions: HashMap::new(),
            bundles: HashMap::new(),
            direct: HashMap::new(),
        }
    }

    pub fn builder() -> RuleTableBuilder {
        RuleTableBuilder::new()
    }

    /// Whether this table can never change anything in a class
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.direct.is_empty()
    }

    fn renames(&self, form: NameForm) -> &Renames {
        match form {
            NameForm::Dotted => &self.dotted,
            NameForm::Binary => &self.binary,
        }
    }

    /// Rename a package
    ///
    /// Exact rules are tried first, then the longest wildcard rule which is a whole-package
    /// prefix of the name. `None` means the package does not change.
    pub fn rename(&self, name: &str, form: NameForm) -> Option<String> {
        let renames = self.renames(form);
        let renamed = match renames.exact.get(name) {
            Some(replacement) => replacement.clone(),
            None => {
                let rule = renames.wildcards.iter().find(|rule| {
                    name.starts_with(&rule.key) && is_genuine_match(name, 0, rule.key.len(), true)
                })?;
                format!("{}{}", rule.replacement, &name[rule.key.len()..])
            }
        };
        if renamed == name {
            None
        } else {
            Some(renamed)
        }
    }

    /// Rename the package of a binary class name (`javax/servlet/Servlet`)
    ///
    /// Array classes (`[Ljavax/servlet/Servlet;`) have their element class renamed. Classes in the
    /// default package never change.
    pub fn rename_binary_type(&self, name: &str) -> Option<String> {
        let element = name.trim_start_matches('[');
        if element.len() != name.len() {
            let dimensions = &name[..name.len() - element.len()];
            let class = element.strip_prefix('L')?.strip_suffix(';')?;
            let renamed = self.rename_binary_type(class)?;
            return Some(format!("{}L{};", dimensions, renamed));
        }

        let (package, simple_name) = name.rsplit_once('/')?;
        let package = self.rename(package, NameForm::Binary)?;
        Some(format!("{}/{}", package, simple_name))
    }

    /// Replace every whole-package occurrence of every rule key inside some text
    ///
    /// Longer keys are substituted first. Exact rules only match a package followed by a class
    /// name (see [`is_genuine_match`]), wildcard rules also match sub-packages.
    pub fn replace_packages(&self, text: &str, form: NameForm) -> Option<String> {
        let mut text = Cow::Borrowed(text);
        for rule in &self.renames(form).by_length {
            let mut from = 0;
            while let Some(found) = text[from..].find(rule.key.as_str()) {
                let start = from + found;
                let end = start + rule.key.len();
                if is_genuine_match(&text, start, rule.key.len(), rule.wildcard) {
                    let mut replaced = String::with_capacity(text.len() + rule.replacement.len());
                    replaced.push_str(&text[..start]);
                    replaced.push_str(&rule.replacement);
                    replaced.push_str(&text[end..]);
                    text = Cow::Owned(replaced);
                    from = start + rule.replacement.len();
                } else {
                    from = end;
                }
            }
        }
        match text {
            Cow::Owned(replaced) => Some(replaced),
            Cow::Borrowed(_) => None,
        }
    }

    /// Exact replacement for a whole string constant
    pub fn direct_string(&self, value: &str) -> Option<&str> {
        self.direct.get(value).map(String::as_str)
    }

    /// Version range to use for a renamed package, keyed by its new (dotted) name
    pub fn version_for(&self, new_package: &str) -> Option<&str> {
        self.versions.get(new_package).map(String::as_str)
    }

    /// Identity update for a bundle, keyed by its current symbolic name
    pub fn bundle(&self, symbolic_name: &str) -> Option<&BundleIdentity> {
        self.bundles.get(symbolic_name)
    }

    /// Table which undoes this one
    ///
    /// Package renames and direct strings are reversed. Versions and bundle identities only make
    /// sense in the forward direction and are left out.
    pub fn inverted(&self) -> Result<RuleTable, RuleError> {
        let mut builder = RuleTableBuilder::new();
        for rule in &self.rules {
            builder.push_rule(Rule {
                key: rule.replacement.clone(),
                replacement: rule.key.clone(),
                wildcard: rule.wildcard,
            });
        }
        for (from, to) in &self.direct {
            builder = builder.direct(to.clone(), from.clone());
        }
        builder.build()
    }
}

/// Collects rules for a [`RuleTable`]
///
/// Package names may be given in either form (`javax.servlet` or `javax/servlet`). A key ending
/// in the wildcard suffix (`.*` unless changed) matches sub-packages too.
#[derive(Debug)]
pub struct RuleTableBuilder {
    wildcard_suffix: String,
    rules: Vec<Rule>,
    versions: Vec<(String, String)>,
    bundles: Vec<BundleIdentity>,
    bundle_keys: Vec<String>,
    direct: Vec<(String, String)>,
    invert: bool,
}

impl Default for RuleTableBuilder {
    fn default() -> Self {
        RuleTableBuilder::new()
    }
}

impl RuleTableBuilder {
    pub const DEFAULT_WILDCARD_SUFFIX: &'static str = ".*";

    pub fn new() -> RuleTableBuilder {
        RuleTableBuilder {
            wildcard_suffix: Self::DEFAULT_WILDCARD_SUFFIX.to_owned(),
            rules: vec![],
            versions: vec![],
            bundles: vec![],
            bundle_keys: vec![],
            direct: vec![],
            invert: false,
        }
    }

    /// Change the suffix marking wildcard keys (only affects renames added afterwards)
    pub fn wildcard_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.wildcard_suffix = suffix.into();
        self
    }

    /// Add a package rename
    pub fn rename(mut self, key: impl AsRef<str>, replacement: impl AsRef<str>) -> Self {
        let key = key.as_ref().trim().replace('/', ".");
        let replacement = replacement.as_ref().trim().replace('/', ".");
        let (key, wildcard) = match key.strip_suffix(self.wildcard_suffix.as_str()) {
            Some(stripped) => (stripped.to_owned(), true),
            None => (key, false),
        };
        let replacement = match replacement.strip_suffix(self.wildcard_suffix.as_str()) {
            Some(stripped) => stripped.to_owned(),
            None => replacement,
        };
        self.push_rule(Rule {
            key,
            replacement,
            wildcard,
        });
        self
    }

    fn push_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Add an exact full-string replacement
    pub fn direct(mut self, value: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.direct.push((value.into(), replacement.into()));
        self
    }

    /// Add a version range for a (new) package
    pub fn version(mut self, new_package: impl AsRef<str>, range: impl Into<String>) -> Self {
        let new_package = new_package.as_ref().trim().replace('/', ".");
        self.versions.push((new_package, range.into()));
        self
    }

    /// Add a bundle identity update for the bundle currently named `symbolic_name`
    pub fn bundle(mut self, symbolic_name: impl Into<String>, identity: BundleIdentity) -> Self {
        self.bundle_keys.push(symbolic_name.into());
        self.bundles.push(identity);
        self
    }

    /// Build the table undoing the renames instead
    pub fn invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn build(self) -> Result<RuleTable, RuleError> {
        let mut keys = HashSet::new();
        for rule in &self.rules {
            if rule.key.is_empty() {
                return Err(RuleError::EmptyKey);
            }
            if !keys.insert(rule.key.as_str()) {
                return Err(RuleError::DuplicateKey(rule.key.clone()));
            }
        }

        let mut direct = HashMap::new();
        for (value, replacement) in self.direct {
            if value.is_empty() {
                return Err(RuleError::EmptyKey);
            }
            if direct.contains_key(&value) {
                return Err(RuleError::DuplicateKey(value));
            }
            direct.insert(value, replacement);
        }

        let table = RuleTable {
            dotted: Renames::new(&self.rules, NameForm::Dotted),
            binary: Renames::new(&self.rules, NameForm::Binary),
            rules: self.rules,
            versions: self.versions.into_iter().collect(),
            bundles: self.bundle_keys.into_iter().zip(self.bundles).collect(),
            direct,
        };
        log::debug!(
            "Built rule table with {} renames and {} direct strings",
            table.rules.len(),
            table.direct.len()
        );

        if self.invert {
            table.inverted()
        } else {
            Ok(table)
        }
    }
}
