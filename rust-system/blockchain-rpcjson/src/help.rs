//! Usage and help text generated from registered descriptors

use crate::{
    descriptor::FieldDescriptor,
    field::TypeShape,
    registry::{CommandInfo, Registry},
    Error, ErrorKind, Result,
};

fn arg_usage(field: &FieldDescriptor) -> String {
    let name = field.name;
    let usage = match field.shape.unwrapped() {
        TypeShape::String | TypeShape::Enum(_) => format!("\"{}\"", name),
        TypeShape::Sequence(inner) if **inner == TypeShape::String => format!("[\"{}\",...]", name),
        TypeShape::Sequence(_) => format!("[{},...]", name),
        TypeShape::Mapping(_) => format!("{{\"key\":{},...}}", name),
        _ => name.to_string(),
    };

    match &field.default {
        Some(default) => format!("{}={}", usage, default),
        None => usage,
    }
}

fn usage_line(info: &CommandInfo) -> String {
    let (required, optional): (Vec<_>, Vec<_>) = info.fields().iter().partition(|field| !field.optional);
    let mut line = info.method().to_string();
    for field in required {
        line.push(' ');
        line.push_str(&arg_usage(field));
    }
    if !optional.is_empty() {
        let optional: Vec<String> = optional.into_iter().map(arg_usage).collect();
        line.push_str(&format!(" ({})", optional.join(" ")));
    }
    line
}

impl Registry {
    /// One-line usage, e.g. `getblock "hash" (verbosity=1)`
    pub fn method_usage(&self, method: &str) -> Result<String> {
        self.command(method).map(usage_line)
    }

    /// Usage followed by the method's description. Methods registered without
    /// a description only fail here, not at registration.
    pub fn help_text(&self, method: &str) -> Result<String> {
        let info = self.command(method)?;
        let description = info.description().ok_or_else(|| {
            Error::new(
                ErrorKind::MissingDescription,
                format!("no help description registered for method {:?}", method),
            )
        })?;
        Ok(format!("{}\n\n{}\n", usage_line(info), description))
    }

    /// Usage lines for every registered method, sorted by name
    pub fn usage_overview(&self) -> String {
        self.registered_methods()
            .into_iter()
            .filter_map(|method| self.method_usage(method).ok())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
