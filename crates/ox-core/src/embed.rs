//! File embedding for literal expressions.
//!
//! Supports the `include_bytes!`/`include_str!` style builtins: load raw
//! bytes or UTF-8 text from disk and hand them back as ready-made HIR
//! literal fragments for the caller to splice in. Peripheral to the
//! lowering core; no macro parsing happens here.

use crate::error::{Error, Result};
use crate::hir::{ArrayElems, Expr, ExprKind, Lit, NodeMappings};
use crate::span::Span;
use std::fs;
use std::path::Path;

pub fn load_file_bytes(filename: &Path) -> Result<Vec<u8>> {
    fs::read(filename)
        .map_err(|e| Error::Generic(format!("cannot open filename {}: {}", filename.display(), e)))
}

/// Expand to a fixed-size array of byte literals, the payload of a
/// `&'static [u8; N]` expression.
pub fn include_bytes_expr(filename: &Path, mappings: NodeMappings, span: Span) -> Result<Expr> {
    let bytes = load_file_bytes(filename)?;

    let elements = bytes
        .into_iter()
        .map(|byte| Expr::new(mappings, ExprKind::Literal(Lit::Byte(byte)), span))
        .collect();

    Ok(Expr::new(
        mappings,
        ExprKind::Array(ArrayElems::Values(elements)),
        span,
    ))
}

/// Expand to a string literal. The file must be UTF-8 encoded.
pub fn include_str_expr(filename: &Path, mappings: NodeMappings, span: Span) -> Result<Expr> {
    let bytes = load_file_bytes(filename)?;
    let text = String::from_utf8(bytes).map_err(|_| {
        Error::Generic(format!(
            "file {} is not valid UTF-8",
            filename.display()
        ))
    })?;

    Ok(Expr::new(mappings, ExprKind::Literal(Lit::Str(text)), span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn mappings() -> NodeMappings {
        NodeMappings::new(0, 1, 1)
    }

    #[test]
    fn includes_bytes_as_array_literal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ab").unwrap();

        let expr = include_bytes_expr(file.path(), mappings(), Span::dummy()).unwrap();
        match expr.kind {
            ExprKind::Array(ArrayElems::Values(elements)) => {
                assert_eq!(elements.len(), 2);
                assert_eq!(elements[0].kind, ExprKind::Literal(Lit::Byte(b'a')));
                assert_eq!(elements[1].kind, ExprKind::Literal(Lit::Byte(b'b')));
            }
            other => panic!("expected array literal, got {:?}", other),
        }
    }

    #[test]
    fn includes_str_and_rejects_invalid_utf8() {
        let mut ok = tempfile::NamedTempFile::new().unwrap();
        ok.write_all("héllo".as_bytes()).unwrap();
        let expr = include_str_expr(ok.path(), mappings(), Span::dummy()).unwrap();
        assert_eq!(expr.kind, ExprKind::Literal(Lit::Str("héllo".into())));

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        bad.write_all(&[0xff, 0xfe]).unwrap();
        assert!(include_str_expr(bad.path(), mappings(), Span::dummy()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let missing = Path::new("/definitely/not/here.bin");
        assert!(load_file_bytes(missing).is_err());
    }
}
