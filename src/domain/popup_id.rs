/// Identity of a popup configuration, as handed out by the host (usually a
/// numeric post id). Ends up inside cache keys and token payloads, so only a
/// conservative character set is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PopupId(String);

impl TryFrom<String> for PopupId {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let value = value.trim();
        if value.is_empty() {
            anyhow::bail!("Popup id cannot be empty")
        }
        let max_chars = 64;
        if value.len() > max_chars {
            anyhow::bail!("Popup id cannot be longer than {max_chars} characters")
        }
        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            anyhow::bail!("Popup id cannot contain {c:?}")
        }
        Ok(Self(value.to_string()))
    }
}

impl AsRef<str> for PopupId {
    fn as_ref(&self) -> &str { &self.0 }
}

impl std::fmt::Display for PopupId {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
