//! Type system for Ahoy
//!
//! Ahoy types are a small closed tag set. Containers optionally carry
//! element/key annotations (`array[int]`, `dict<string,string>`); a bare
//! `array`/`dict` is dynamically typed at the element level and the
//! generated containers carry per-slot type tags instead.

use std::fmt;

/// Ahoy-level types as declared in source or inferred by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AhoyType {
    Int,
    Float,
    Str,
    Bool,
    Char,
    /// Dynamic array; `Some` when the element type was annotated
    Array(Option<Box<AhoyType>>),
    /// Hash map; `Some` when key/value types were annotated
    Dict(Option<(Box<AhoyType>, Box<AhoyType>)>),
    /// Untyped function parameter: pointer-wide integer at the C level
    Generic,
    /// Return type to be inferred from the first `return` statement
    Infer,
    Void,
    /// JSON runtime value
    Json,
    Color,
    Vector2,
    /// User struct or enum name
    Named(String),
    /// No single type applies (untyped container contents)
    Mixed,
}

impl AhoyType {
    /// Parse a type annotation as written in Ahoy source.
    ///
    /// Returns `None` for annotations that are not types (so callers can
    /// treat the token as something else, e.g. a default value).
    pub fn parse(text: &str) -> Option<AhoyType> {
        let text = text.trim();
        match text {
            "int" => Some(AhoyType::Int),
            "float" => Some(AhoyType::Float),
            "string" => Some(AhoyType::Str),
            "bool" => Some(AhoyType::Bool),
            "char" => Some(AhoyType::Char),
            "array" => Some(AhoyType::Array(None)),
            "dict" => Some(AhoyType::Dict(None)),
            "generic" => Some(AhoyType::Generic),
            "infer" => Some(AhoyType::Infer),
            "void" => Some(AhoyType::Void),
            "JSON" | "json" => Some(AhoyType::Json),
            "color" => Some(AhoyType::Color),
            "vector2" => Some(AhoyType::Vector2),
            "mixed" => Some(AhoyType::Mixed),
            _ => {
                if let Some(elem) = text.strip_prefix("array[").and_then(|t| t.strip_suffix(']')) {
                    return AhoyType::parse(elem).map(|e| AhoyType::Array(Some(Box::new(e))));
                }
                if let Some(kv) = text.strip_prefix("dict<").and_then(|t| t.strip_suffix('>')) {
                    let mut parts = kv.splitn(2, ',');
                    let k = AhoyType::parse(parts.next()?)?;
                    let v = AhoyType::parse(parts.next()?)?;
                    return Some(AhoyType::Dict(Some((Box::new(k), Box::new(v)))));
                }
                // A capitalized bare word is a user type name
                if !text.is_empty()
                    && text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    return Some(AhoyType::Named(text.to_string()));
                }
                None
            }
        }
    }

    /// The C type this Ahoy type compiles to.
    pub fn c_type(&self) -> String {
        match self {
            AhoyType::Int => "int".to_string(),
            AhoyType::Float => "double".to_string(),
            AhoyType::Str => "char*".to_string(),
            AhoyType::Bool => "bool".to_string(),
            AhoyType::Char => "char".to_string(),
            AhoyType::Array(_) => "AhoyArray".to_string(),
            AhoyType::Dict(_) => "HashMap".to_string(),
            AhoyType::Generic => "intptr_t".to_string(),
            AhoyType::Infer | AhoyType::Mixed => "intptr_t".to_string(),
            AhoyType::Void => "void".to_string(),
            AhoyType::Json => "AhoyJSON*".to_string(),
            AhoyType::Color => "AhoyColor".to_string(),
            AhoyType::Vector2 => "AhoyVector2".to_string(),
            AhoyType::Named(name) => name.clone(),
        }
    }

    /// The element type tag stored in the runtime containers.
    pub fn value_tag(&self) -> &'static str {
        match self {
            AhoyType::Float => "AHOY_FLOAT",
            AhoyType::Str => "AHOY_STRING",
            AhoyType::Char => "AHOY_CHAR",
            _ => "AHOY_INT",
        }
    }

    /// printf conversion for a value of this type.
    pub fn format_spec(&self) -> &'static str {
        match self {
            AhoyType::Float => "%g",
            AhoyType::Str => "%s",
            AhoyType::Char => "%c",
            AhoyType::Bool => "%s",
            _ => "%d",
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, AhoyType::Array(_))
    }

    pub fn is_dict(&self) -> bool {
        matches!(self, AhoyType::Dict(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, AhoyType::Str)
    }

    /// Element type of an annotated array, if any.
    pub fn element_type(&self) -> Option<&AhoyType> {
        match self {
            AhoyType::Array(Some(elem)) => Some(elem),
            _ => None,
        }
    }
}

impl fmt::Display for AhoyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AhoyType::Int => write!(f, "int"),
            AhoyType::Float => write!(f, "float"),
            AhoyType::Str => write!(f, "string"),
            AhoyType::Bool => write!(f, "bool"),
            AhoyType::Char => write!(f, "char"),
            AhoyType::Array(None) => write!(f, "array"),
            AhoyType::Array(Some(e)) => write!(f, "array[{}]", e),
            AhoyType::Dict(None) => write!(f, "dict"),
            AhoyType::Dict(Some((k, v))) => write!(f, "dict<{},{}>", k, v),
            AhoyType::Generic => write!(f, "generic"),
            AhoyType::Infer => write!(f, "infer"),
            AhoyType::Void => write!(f, "void"),
            AhoyType::Json => write!(f, "JSON"),
            AhoyType::Color => write!(f, "color"),
            AhoyType::Vector2 => write!(f, "vector2"),
            AhoyType::Named(name) => write!(f, "{}", name),
            AhoyType::Mixed => write!(f, "mixed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_types() {
        assert_eq!(AhoyType::parse("int"), Some(AhoyType::Int));
        assert_eq!(AhoyType::parse("float"), Some(AhoyType::Float));
        assert_eq!(AhoyType::parse("string"), Some(AhoyType::Str));
        assert_eq!(AhoyType::parse("bool"), Some(AhoyType::Bool));
    }

    #[test]
    fn test_parse_typed_array() {
        assert_eq!(
            AhoyType::parse("array[int]"),
            Some(AhoyType::Array(Some(Box::new(AhoyType::Int))))
        );
    }

    #[test]
    fn test_parse_typed_dict() {
        assert_eq!(
            AhoyType::parse("dict<string,int>"),
            Some(AhoyType::Dict(Some((
                Box::new(AhoyType::Str),
                Box::new(AhoyType::Int)
            ))))
        );
    }

    #[test]
    fn test_parse_user_type() {
        assert_eq!(
            AhoyType::parse("Point"),
            Some(AhoyType::Named("Point".to_string()))
        );
    }

    #[test]
    fn test_display_round_trip() {
        for spelling in ["int", "array[float]", "dict<string,string>", "generic"] {
            let ty = AhoyType::parse(spelling).unwrap();
            assert_eq!(ty.to_string(), spelling);
        }
    }

    #[test]
    fn test_c_mapping() {
        assert_eq!(AhoyType::Int.c_type(), "int");
        assert_eq!(AhoyType::Float.c_type(), "double");
        assert_eq!(AhoyType::Str.c_type(), "char*");
        assert_eq!(AhoyType::Generic.c_type(), "intptr_t");
        assert_eq!(AhoyType::Array(None).c_type(), "AhoyArray");
        assert_eq!(AhoyType::Dict(None).c_type(), "HashMap");
    }

    #[test]
    fn test_value_tags() {
        assert_eq!(AhoyType::Int.value_tag(), "AHOY_INT");
        assert_eq!(AhoyType::Float.value_tag(), "AHOY_FLOAT");
        assert_eq!(AhoyType::Str.value_tag(), "AHOY_STRING");
        assert_eq!(AhoyType::Char.value_tag(), "AHOY_CHAR");
    }
}
