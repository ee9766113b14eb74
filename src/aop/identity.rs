use std::fmt;

/// 方法标识：声明类型 + 方法名
///
/// 每次调用创建，只读
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodIdentity {
    declaring_type: String,
    method_name: String,
}

impl MethodIdentity {
    pub fn new(declaring_type: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            method_name: method_name.into(),
        }
    }

    /// 解析 `Type.method` 或 `Type::method`，以最后一个分隔符切分
    pub fn parse(signature: &str) -> Option<Self> {
        let (declaring_type, method_name) = split_qualified(signature)?;
        Some(Self::new(declaring_type, method_name))
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// `Type.method`，用作分发表的键
    pub fn signature(&self) -> String {
        format!("{}.{}", self.declaring_type, self.method_name)
    }
}

impl fmt::Display for MethodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.method_name)
    }
}

/// 以最后一个 `.` 或 `::` 把限定名切成（类型，方法），两边都不能为空
pub(crate) fn split_qualified(qualified: &str) -> Option<(&str, &str)> {
    let dot = qualified.rfind('.').map(|i| (i, 1));
    let colons = qualified.rfind("::").map(|i| (i, 2));

    let (index, len) = match (dot, colons) {
        (Some(d), Some(c)) => {
            if c.0 > d.0 {
                c
            } else {
                d
            }
        }
        (Some(d), None) => d,
        (None, Some(c)) => c,
        (None, None) => return None,
    };

    let (declaring_type, method_name) = (&qualified[..index], &qualified[index + len..]);
    if declaring_type.is_empty() || method_name.is_empty() {
        return None;
    }
    Some((declaring_type, method_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_accessors() {
        let identity = MethodIdentity::new("AopDemoController", "getBooks");
        assert_eq!(identity.declaring_type(), "AopDemoController");
        assert_eq!(identity.method_name(), "getBooks");
        assert_eq!(identity.signature(), "AopDemoController.getBooks");
        assert_eq!(identity.to_string(), "AopDemoController.getBooks");
    }

    #[test]
    fn test_identity_parse() {
        assert_eq!(
            MethodIdentity::parse("yavi_validation.controller.AopDemoController.addBook"),
            Some(MethodIdentity::new(
                "yavi_validation.controller.AopDemoController",
                "addBook"
            ))
        );
        assert_eq!(
            MethodIdentity::parse("books::BookController::add_book"),
            Some(MethodIdentity::new("books::BookController", "add_book"))
        );
        assert_eq!(MethodIdentity::parse("getBooks"), None);
        assert_eq!(MethodIdentity::parse("Type."), None);
        assert_eq!(MethodIdentity::parse(".method"), None);
    }

    #[test]
    fn test_split_qualified_picks_last_separator() {
        assert_eq!(split_qualified("a::b.c"), Some(("a::b", "c")));
        assert_eq!(split_qualified("a.b::c"), Some(("a.b", "c")));
        assert_eq!(split_qualified("*Controller.*"), Some(("*Controller", "*")));
    }
}
