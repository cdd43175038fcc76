//! Recursive-descent parser for the type-name grammar.
//!
//! The parser is LL(1) on the current token kind everywhere except the `[`
//! following a nominal name, which opens either a generic-argument list or an
//! array-rank specifier. That single ambiguity is resolved with an explicit
//! scanner snapshot: advance past the bracket, peek whether the next token
//! can start a type name, and rewind when it cannot. No other backtracking
//! exists, and no speculative parsing happens through error control flow.
//!
//! Modifier suffixes are applied left to right, so "Foo[]*" is a pointer to a
//! vector of Foo while "Foo*[]" is a vector of pointers to Foo. At most one
//! trailing `&` is accepted, producing the outermost managed-pointer wrapper.

use crate::{
    identity::{AssemblyIdentity, AssemblyVersion},
    intern::{Name, NamePool},
    typename::{
        ast::{ArrayName, GenericName, NamespaceName, NestedName, QualifiedName, TypeName},
        scanner::{ScanMode, Scanner, TokenKind},
    },
};

/// Maximum bracket-nesting depth accepted inside generic arguments.
///
/// Legitimate names nest a handful of levels; hostile inputs can nest
/// thousands and would otherwise exhaust the call stack.
const MAX_NESTING_DEPTH: usize = 64;

/// Parse a textual type name into a [`TypeName`] tree.
///
/// Returns `None` unless the entire input is consumed and well-formed;
/// trailing garbage is a failure, not silently ignored.
///
/// # Examples
///
/// ```rust
/// use cildecode::{parse_type_name, NamePool, TypeName};
///
/// let pool = NamePool::new();
///
/// let name = parse_type_name("System.Nullable`1[System.Int32]", &pool).unwrap();
/// let TypeName::Generic(generic) = &name else { panic!() };
/// assert_eq!(generic.template.generic_arity(), 1);
///
/// assert!(parse_type_name("System.Int32]", &pool).is_none());
/// ```
#[must_use]
pub fn parse_type_name(input: &str, names: &NamePool) -> Option<TypeName> {
    let mut parser = TypeNameParser::new(input, names);
    parser.scanner.advance(ScanMode::TypeName);
    let ty = parser.parse_full_name()?;

    if parser.scanner.current().kind != TokenKind::End {
        return None;
    }
    Some(ty)
}

/// Parse a standalone assembly display name ("mscorlib, Version=4.0.0.0,
/// Culture=neutral, PublicKeyToken=b77a5c561934e089").
///
/// Same grammar as the qualifier suffix of [`parse_type_name`]; returns
/// `None` for malformed input.
#[must_use]
pub fn parse_assembly_identity(input: &str, names: &NamePool) -> Option<AssemblyIdentity> {
    let mut parser = TypeNameParser::new(input, names);
    parser.scanner.advance(ScanMode::AssemblyName);
    let identity = parser.parse_assembly_name()?;

    if parser.scanner.current().kind != TokenKind::End {
        return None;
    }
    Some(identity)
}

struct TypeNameParser<'a> {
    scanner: Scanner<'a>,
    names: &'a NamePool,
    depth: usize,
}

impl<'a> TypeNameParser<'a> {
    fn new(input: &'a str, names: &'a NamePool) -> Self {
        TypeNameParser {
            scanner: Scanner::new(input, names),
            names,
            depth: 0,
        }
    }

    /// FullName := Type [ ',' AssemblyName ]
    fn parse_full_name(&mut self) -> Option<TypeName> {
        let ty = self.parse_type_with_modifiers()?;

        if self.scanner.current().kind == TokenKind::Comma {
            self.scanner.advance(ScanMode::AssemblyName);
            let identity = self.parse_assembly_name()?;
            return Some(TypeName::Qualified(QualifiedName {
                inner: Box::new(ty),
                identity,
            }));
        }

        Some(ty)
    }

    /// Type := PossiblyGeneric { '*' | '[' Rank ']' } [ '&' ]
    fn parse_type_with_modifiers(&mut self) -> Option<TypeName> {
        let mut ty = self.parse_possibly_generic()?;

        loop {
            match self.scanner.current().kind {
                TokenKind::Star => {
                    self.scanner.advance(ScanMode::TypeName);
                    ty = TypeName::Pointer(Box::new(ty));
                }
                TokenKind::OpenBracket => {
                    self.scanner.advance(ScanMode::TypeName);
                    let rank = self.parse_array_rank()?;
                    ty = TypeName::Array(ArrayName {
                        element: Box::new(ty),
                        rank,
                    });
                }
                TokenKind::Ampersand => {
                    self.scanner.advance(ScanMode::TypeName);
                    // The managed-pointer wrapper ends the modifier list.
                    return Some(TypeName::ByRef(Box::new(ty)));
                }
                _ => return Some(ty),
            }
        }
    }

    /// Rank := '' | '*' | ','+  with the closing ']' consumed on exit.
    fn parse_array_rank(&mut self) -> Option<u32> {
        let rank = match self.scanner.current().kind {
            TokenKind::Star => {
                self.scanner.advance(ScanMode::TypeName);
                1
            }
            TokenKind::Comma => {
                let mut commas = 0u32;
                while self.scanner.current().kind == TokenKind::Comma {
                    commas += 1;
                    self.scanner.advance(ScanMode::TypeName);
                }
                commas + 1
            }
            _ => 0,
        };

        if self.scanner.current().kind != TokenKind::CloseBracket {
            return None;
        }
        self.scanner.advance(ScanMode::TypeName);
        Some(rank)
    }

    /// PossiblyGeneric := Nominal [ '[' GenericArg (',' GenericArg)* ']' ]
    ///
    /// The one backtracking point of the grammar: a '[' here commits to a
    /// generic-argument list only when the token after it can start a type
    /// name; otherwise the scanner rewinds and the bracket is left for the
    /// array-rank modifier loop.
    fn parse_possibly_generic(&mut self) -> Option<TypeName> {
        let nominal = self.parse_nominal()?;

        if self.scanner.current().kind == TokenKind::OpenBracket {
            let snapshot = self.scanner.snapshot();
            self.scanner.advance(ScanMode::TypeName);

            match self.scanner.current().kind {
                TokenKind::Identifier | TokenKind::OpenBracket => {
                    let args = self.parse_generic_arguments()?;
                    return Some(TypeName::Generic(GenericName {
                        template: Box::new(nominal),
                        args,
                    }));
                }
                _ => self.scanner.restore(snapshot),
            }
        }

        Some(nominal)
    }

    /// Comma-separated argument list with the closing ']' consumed on exit.
    fn parse_generic_arguments(&mut self) -> Option<Vec<TypeName>> {
        if self.depth >= MAX_NESTING_DEPTH {
            return None;
        }
        self.depth += 1;
        let result = self.parse_generic_arguments_inner();
        self.depth -= 1;
        result
    }

    fn parse_generic_arguments_inner(&mut self) -> Option<Vec<TypeName>> {
        let mut args = Vec::new();
        loop {
            args.push(self.parse_generic_argument()?);
            match self.scanner.current().kind {
                TokenKind::Comma => self.scanner.advance(ScanMode::TypeName),
                TokenKind::CloseBracket => {
                    self.scanner.advance(ScanMode::TypeName);
                    return Some(args);
                }
                _ => return None,
            }
        }
    }

    /// GenericArg := '[' FullName ']' | Type
    ///
    /// The bracketed form is the only place an argument may carry its own
    /// assembly qualifier.
    fn parse_generic_argument(&mut self) -> Option<TypeName> {
        if self.scanner.current().kind != TokenKind::OpenBracket {
            return self.parse_type_with_modifiers();
        }

        self.scanner.advance(ScanMode::TypeName);
        let ty = self.parse_full_name()?;
        if self.scanner.current().kind != TokenKind::CloseBracket {
            return None;
        }
        self.scanner.advance(ScanMode::TypeName);
        Some(ty)
    }

    /// Nominal := Identifier ('.' Identifier)* ('+' Identifier)*
    ///
    /// Dots build the namespace path up to the first '+'; every further '+'
    /// segment nests.
    fn parse_nominal(&mut self) -> Option<TypeName> {
        let mut segments = vec![self.expect_identifier(ScanMode::TypeName)?];
        while self.scanner.current().kind == TokenKind::Dot {
            self.scanner.advance(ScanMode::TypeName);
            segments.push(self.expect_identifier(ScanMode::TypeName)?);
        }

        let raw = segments.pop()?;
        let mut ty = TypeName::Namespace(NamespaceName::new(self.names, segments, raw.as_str()));

        while self.scanner.current().kind == TokenKind::Plus {
            self.scanner.advance(ScanMode::TypeName);
            let nested = self.expect_identifier(ScanMode::TypeName)?;
            ty = TypeName::Nested(NestedName::new(self.names, ty, nested.as_str()));
        }

        Some(ty)
    }

    /// AssemblyName := Identifier { ',' Key '=' Value }
    ///
    /// Recognized keys: Version, Culture, PublicKeyToken, Retargetable. A
    /// recognized key appearing twice or carrying a malformed value is a hard
    /// failure; unrecognized pairs are skipped token-by-token up to the next
    /// ',' / ']' / end for forward compatibility.
    fn parse_assembly_name(&mut self) -> Option<AssemblyIdentity> {
        let simple_name = self.expect_identifier(ScanMode::AssemblyName)?;
        let mut identity = AssemblyIdentity::with_name(simple_name);

        let mut seen_version = false;
        let mut seen_culture = false;
        let mut seen_token = false;
        let mut seen_retargetable = false;

        while self.scanner.current().kind == TokenKind::Comma {
            self.scanner.advance(ScanMode::AssemblyName);

            let Some(key) = self.expect_identifier(ScanMode::AssemblyName) else {
                return None;
            };

            if self.scanner.current().kind != TokenKind::Equals {
                self.skip_unknown_pair();
                continue;
            }
            self.scanner.advance(ScanMode::AssemblyName);

            let key = key.as_str();
            if key.eq_ignore_ascii_case("Version") {
                if seen_version {
                    return None;
                }
                seen_version = true;
                let value = self.expect_identifier(ScanMode::AssemblyName)?;
                identity.version = AssemblyVersion::parse(value.as_str()).ok()?;
            } else if key.eq_ignore_ascii_case("Culture") {
                if seen_culture {
                    return None;
                }
                seen_culture = true;
                let value = self.expect_identifier(ScanMode::AssemblyName)?;
                if !value.as_str().eq_ignore_ascii_case("neutral") {
                    identity.culture = Some(value.as_str().to_string());
                }
            } else if key.eq_ignore_ascii_case("PublicKeyToken") {
                if seen_token {
                    return None;
                }
                seen_token = true;
                let value = self.expect_identifier(ScanMode::AssemblyName)?;
                if !value.as_str().eq_ignore_ascii_case("null") {
                    let bytes = hex::decode(value.as_str()).ok()?;
                    identity.public_key_token = Some(bytes.try_into().ok()?);
                }
            } else if key.eq_ignore_ascii_case("Retargetable") {
                if seen_retargetable {
                    return None;
                }
                seen_retargetable = true;
                let value = self.expect_identifier(ScanMode::AssemblyName)?;
                // Anything other than "true" reads as false. Long-standing
                // leniency in the reflection format; kept as-is.
                identity.retargetable = value.as_str().eq_ignore_ascii_case("true");
            } else {
                self.skip_unknown_pair();
            }
        }

        Some(identity)
    }

    /// Skip tokens up to the next ',' / ']' / end without interpreting them.
    fn skip_unknown_pair(&mut self) {
        loop {
            match self.scanner.current().kind {
                TokenKind::Comma | TokenKind::CloseBracket | TokenKind::End => return,
                _ => self.scanner.advance(ScanMode::AssemblyName),
            }
        }
    }

    fn expect_identifier(&mut self, mode: ScanMode) -> Option<Name> {
        if self.scanner.current().kind != TokenKind::Identifier {
            return None;
        }
        let name = self.scanner.current().text.clone();
        self.scanner.advance(mode);
        name
    }
}
