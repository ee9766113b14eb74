//! 切点表达式
//!
//! ```text
//! pointcut := fragment ( "||" fragment )*
//! fragment := "execution(" [ret-type] type-pattern sep method-pattern "(" params ")" ")"
//!           | type-pattern sep method-pattern
//! sep      := "." | "::"
//! ```
//!
//! 返回类型和参数列表不参与匹配。类型模式中的 `..` 视为 `*`。

use crate::aop::error::AopError;
use crate::aop::identity::{split_qualified, MethodIdentity};
use glob::Pattern;
use std::fmt;
use std::str::FromStr;

/// 切点：若干片段的逻辑或，构建后不可变
#[derive(Debug, Clone)]
pub struct Pointcut {
    expression: String,
    fragments: Vec<Fragment>,
}

/// `None` 表示 `*`
#[derive(Debug, Clone)]
struct Fragment {
    declaring_type: Option<Pattern>,
    method_name: Option<Pattern>,
}

impl Pointcut {
    pub fn parse(expression: &str) -> Result<Self, AopError> {
        if expression.trim().is_empty() {
            return Err(AopError::invalid_pointcut(expression, "empty expression"));
        }

        let fragments = expression
            .split("||")
            .map(|fragment| Fragment::parse(fragment.trim(), expression))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            expression: expression.trim().to_string(),
            fragments,
        })
    }

    /// 匹配任意方法
    pub fn any() -> Self {
        Self {
            expression: "*".to_string(),
            fragments: vec![Fragment::any()],
        }
    }

    /// 任一片段的类型模式和方法模式同时匹配即命中
    pub fn matches(&self, identity: &MethodIdentity) -> bool {
        self.fragments.iter().any(|f| f.matches(identity))
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }
}

impl FromStr for Pointcut {
    type Err = AopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pointcut::parse(s)
    }
}

impl fmt::Display for Pointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

impl Fragment {
    fn any() -> Self {
        Self {
            declaring_type: None,
            method_name: None,
        }
    }

    fn parse(text: &str, expression: &str) -> Result<Self, AopError> {
        let err = |reason: String| AopError::invalid_pointcut(expression, reason);

        if text.is_empty() {
            return Err(err("empty fragment".to_string()));
        }
        if text.contains("&&") || text.starts_with('!') {
            return Err(err(format!("unsupported operator in '{}'", text)));
        }
        check_balanced(text).map_err(&err)?;

        let qualified = match text.find('(') {
            Some(open) => {
                let designator = text[..open].trim();
                if designator != "execution" {
                    return Err(err(format!("unknown designator '{}'", designator)));
                }
                let close = matching_paren(text, open)
                    .ok_or_else(|| err("unbalanced parentheses".to_string()))?;
                if close != text.len() - 1 {
                    return Err(err(format!(
                        "unexpected text after '{}(...)': '{}'",
                        designator,
                        text[close + 1..].trim()
                    )));
                }
                signature_pattern(text[open + 1..close].trim()).map_err(&err)?
            }
            None => {
                if text.contains(char::is_whitespace) {
                    return Err(err(format!("unexpected whitespace in '{}'", text)));
                }
                text
            }
        };

        if qualified == "*" {
            return Ok(Self::any());
        }

        let normalized = normalize(qualified);
        let (declaring_type, method_name) = split_qualified(&normalized)
            .ok_or_else(|| err(format!("missing method part in '{}'", qualified)))?;

        Ok(Self {
            declaring_type: compile(declaring_type).map_err(&err)?,
            method_name: compile(method_name).map_err(&err)?,
        })
    }

    fn matches(&self, identity: &MethodIdentity) -> bool {
        let matches = |pattern: &Option<Pattern>, text: &str| {
            pattern.as_ref().map_or(true, |p| p.matches(text))
        };
        matches(&self.declaring_type, identity.declaring_type())
            && matches(&self.method_name, identity.method_name())
    }
}

/// 从 `[ret] Type.method(params)` 中取出 `Type.method`
fn signature_pattern(signature: &str) -> Result<&str, String> {
    let params_open = signature
        .find('(')
        .ok_or_else(|| format!("missing parameter list in '{}'", signature))?;
    if !signature.ends_with(')') {
        return Err(format!("unexpected text after parameter list in '{}'", signature));
    }

    signature[..params_open]
        .split_whitespace()
        .last()
        .ok_or_else(|| format!("missing method pattern in '{}'", signature))
}

/// `open` 处左括号对应的右括号位置
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

fn check_balanced(text: &str) -> Result<(), String> {
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced parentheses".to_string())?;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unbalanced parentheses".to_string());
    }
    Ok(())
}

/// `..` 折叠为 `*`，连续的 `*` 合并为一个
fn normalize(pattern: &str) -> String {
    let replaced = pattern.replace("..", "*");
    let mut out = String::with_capacity(replaced.len());
    for c in replaced.chars() {
        if c == '*' && out.ends_with('*') {
            continue;
        }
        out.push(c);
    }
    out
}

fn compile(pattern: &str) -> Result<Option<Pattern>, String> {
    if pattern == "*" {
        return Ok(None);
    }
    Pattern::new(pattern)
        .map(Some)
        .map_err(|e| format!("invalid glob '{}': {}", pattern, e.msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(declaring_type: &str, method_name: &str) -> MethodIdentity {
        MethodIdentity::new(declaring_type, method_name)
    }

    #[test]
    fn test_execution_fragment() -> Result<(), AopError> {
        let pointcut =
            Pointcut::parse("execution(* yavi_validation.controller.AopDemoController.*(..))")?;

        assert!(pointcut.matches(&id("yavi_validation.controller.AopDemoController", "getBooks")));
        assert!(pointcut.matches(&id("yavi_validation.controller.AopDemoController", "addBook")));
        assert!(!pointcut.matches(&id("yavi_validation.controller.OtherController", "getBooks")));
        assert!(!pointcut.matches(&id("AopDemoController", "getBooks")));
        Ok(())
    }

    #[test]
    fn test_or_of_fragments() -> Result<(), AopError> {
        let pointcut = Pointcut::parse(
            "execution(* *AopDemoController.*(..)) || execution(* *AopDemoService.*(..))",
        )?;
        assert_eq!(pointcut.fragment_count(), 2);

        assert!(pointcut.matches(&id("AopDemoController", "getBooks")));
        assert!(pointcut.matches(&id("yavi_validation.service.AopDemoService", "save")));
        assert!(!pointcut.matches(&id("AopDemoRepository", "save")));
        Ok(())
    }

    #[test]
    fn test_return_type_and_params_are_ignored() -> Result<(), AopError> {
        let pointcut = Pointcut::parse("execution(String *Controller.add*(String, int))")?;
        assert!(pointcut.matches(&id("AopDemoController", "addBook")));
        assert!(!pointcut.matches(&id("AopDemoController", "getBooks")));

        let pointcut = Pointcut::parse("execution(public java.util.List *Controller.get*())")?;
        assert!(pointcut.matches(&id("AopDemoController", "getBooks")));
        Ok(())
    }

    #[test]
    fn test_bare_fragment_and_rust_paths() -> Result<(), AopError> {
        let pointcut = Pointcut::parse("books::*Controller::get_*")?;
        assert!(pointcut.matches(&id("books::BookController", "get_books")));
        assert!(!pointcut.matches(&id("books::BookController", "add_book")));

        let pointcut = Pointcut::parse("AopDemoController.getBooks")?;
        assert!(pointcut.matches(&id("AopDemoController", "getBooks")));
        assert!(!pointcut.matches(&id("AopDemoController", "getBook")));
        Ok(())
    }

    #[test]
    fn test_wildcards() -> Result<(), AopError> {
        assert!(Pointcut::parse("*")?.matches(&id("Anything", "at_all")));
        assert!(Pointcut::any().matches(&id("Anything", "at_all")));
        assert!(Pointcut::parse("execution(* *.*(..))")?.matches(&id("a.B", "c")));

        let pointcut = Pointcut::parse("execution(* yavi_validation..*Controller.*(..))")?;
        assert!(pointcut.matches(&id("yavi_validation.controller.AopDemoController", "getBooks")));
        assert!(!pointcut.matches(&id("other.controller.AopDemoController", "getBooks")));

        let pointcut = Pointcut::parse("AopDemoController.?etBooks")?;
        assert!(pointcut.matches(&id("AopDemoController", "getBooks")));

        let pointcut = Pointcut::parse("AopDemoController.[!a]*")?;
        assert!(pointcut.matches(&id("AopDemoController", "getBooks")));
        assert!(!pointcut.matches(&id("AopDemoController", "addBook")));
        Ok(())
    }

    #[test]
    fn test_malformed_patterns_rejected() {
        let cases = [
            ("", "empty expression"),
            ("   ", "empty expression"),
            ("execution(* A.*(..)) ||", "empty fragment"),
            ("within(yavi_validation..*)", "unknown designator 'within'"),
            ("(* A.*(..))", "unknown designator ''"),
            ("execution(* A.*(..)", "unbalanced parentheses"),
            ("execution(* A.*(..)))", "unbalanced parentheses"),
            ("execution(* A.*)", "missing parameter list"),
            ("execution(* getBooks(..))", "missing method part"),
            ("AopDemoController", "missing method part"),
            ("execution(* A.[b(..))", "invalid glob"),
            ("AopDemoController.* && AopDemoService.*", "unsupported operator"),
            ("AopDemoController.*&&AopDemoService.*", "unsupported operator"),
            ("!AopDemoController.*", "unsupported operator"),
            ("AopDemoController.getBooks Other.thing", "unexpected whitespace"),
            ("execution(* A.*(..)) execution(* B.*(..))", "unexpected text after 'execution(...)'"),
            ("execution(* A.*(..))B.*", "unexpected text after 'execution(...)'"),
        ];

        for (expression, reason) in cases {
            match Pointcut::parse(expression) {
                Err(AopError::InvalidPointcut { reason: actual, .. }) => {
                    assert!(
                        actual.contains(reason),
                        "'{}': expected '{}', got '{}'",
                        expression,
                        reason,
                        actual
                    );
                }
                other => panic!("'{}': expected InvalidPointcut, got {:?}", expression, other),
            }
        }
    }

    #[test]
    fn test_display_and_from_str() -> Result<(), AopError> {
        let pointcut: Pointcut = " AopDemoController.* ".parse()?;
        assert_eq!(pointcut.to_string(), "AopDemoController.*");
        assert_eq!(pointcut.expression(), "AopDemoController.*");
        Ok(())
    }
}
