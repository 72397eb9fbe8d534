//! Module structure: version declaration, library module declaration,
//! prolog, and the query body.

use crate::diagnostics::DiagnosticKind;
use crate::lexer::TokenKind;
use crate::parser::core::Parser;
use crate::tree::NodeKind;

use super::{EXPR_FIRST, PROLOG_RECOVERY};

impl Parser<'_> {
    /// Root production. Always completes a `Module` node spanning the
    /// whole input, malformed or not.
    pub(crate) fn parse_module(&mut self) {
        let m = self.start();

        if self.at(TokenKind::KwXQuery) && self.nth(1) == TokenKind::KwVersion {
            self.parse_version_decl();
        }

        if self.at(TokenKind::KwModule) && self.nth(1) == TokenKind::KwNamespace {
            self.parse_module_decl();
            self.parse_prolog();
        } else {
            self.parse_prolog();
            if self.at_one_of(EXPR_FIRST) {
                self.parse_query_body();
            }
        }

        // Anything after the query body is an error, but still part of
        // the tree.
        while !self.should_stop() {
            self.error_and_bump(DiagnosticKind::UnexpectedToken);
        }

        self.eat_remaining_trivia();
        self.done(m, NodeKind::Module);
    }

    /// `xquery version "3.1" encoding "utf-8";`
    fn parse_version_decl(&mut self) {
        let m = self.start();
        self.bump(); // xquery
        self.bump(); // version
        self.expect(TokenKind::StringLiteral, "a version string");
        if self.eat(TokenKind::KwEncoding) {
            self.expect(TokenKind::StringLiteral, "an encoding string");
        }
        self.expect(TokenKind::Semicolon, "`;`");
        self.done(m, NodeKind::VersionDecl);
    }

    /// `module namespace prefix = "uri";`
    fn parse_module_decl(&mut self) {
        let m = self.start();
        self.bump(); // module
        self.bump(); // namespace
        if !self.eat_name_token() {
            self.error(DiagnosticKind::ExpectedName);
            self.missing("expected a namespace prefix");
        }
        self.expect(TokenKind::Equals, "`=`");
        self.expect(TokenKind::StringLiteral, "a namespace URI");
        self.expect(TokenKind::Semicolon, "`;`");
        self.done(m, NodeKind::ModuleDecl);
    }

    fn parse_prolog(&mut self) {
        if !self.at_prolog_decl() {
            return;
        }
        let m = self.start();
        while !self.should_stop() {
            match self.current() {
                TokenKind::KwDeclare => match self.nth(1) {
                    TokenKind::KwNamespace => self.parse_namespace_decl(),
                    TokenKind::KwDefault => self.parse_default_namespace_decl(),
                    TokenKind::KwOption => self.parse_option_decl(),
                    TokenKind::KwContext => self.parse_context_item_decl(),
                    TokenKind::KwVariable | TokenKind::KwFunction | TokenKind::Percent => {
                        self.parse_annotated_decl()
                    }
                    _ => break,
                },
                TokenKind::KwImport => match self.nth(1) {
                    TokenKind::KwModule => self.parse_module_import(),
                    TokenKind::KwSchema => self.parse_schema_import(),
                    _ => break,
                },
                _ => break,
            }
        }
        self.done(m, NodeKind::Prolog);
    }

    fn at_prolog_decl(&mut self) -> bool {
        match self.current() {
            TokenKind::KwDeclare => matches!(
                self.nth(1),
                TokenKind::KwNamespace
                    | TokenKind::KwDefault
                    | TokenKind::KwOption
                    | TokenKind::KwContext
                    | TokenKind::KwVariable
                    | TokenKind::KwFunction
                    | TokenKind::Percent
            ),
            TokenKind::KwImport => {
                matches!(self.nth(1), TokenKind::KwModule | TokenKind::KwSchema)
            }
            _ => false,
        }
    }

    /// `declare namespace prefix = "uri";`
    fn parse_namespace_decl(&mut self) {
        let m = self.start();
        self.bump(); // declare
        self.bump(); // namespace
        if !self.eat_name_token() {
            self.error(DiagnosticKind::ExpectedName);
            self.missing("expected a namespace prefix");
        }
        self.expect(TokenKind::Equals, "`=`");
        self.expect(TokenKind::StringLiteral, "a namespace URI");
        self.expect(TokenKind::Semicolon, "`;`");
        self.done(m, NodeKind::NamespaceDecl);
    }

    /// `declare default element namespace "uri";` (or `function`)
    fn parse_default_namespace_decl(&mut self) {
        let m = self.start();
        self.bump(); // declare
        self.bump(); // default
        if !self.eat(TokenKind::KwElement) && !self.eat(TokenKind::KwFunction) {
            self.error_msg(
                DiagnosticKind::UnexpectedToken,
                "expected `element` or `function`",
            );
        }
        self.expect(TokenKind::KwNamespace, "`namespace`");
        self.expect(TokenKind::StringLiteral, "a namespace URI");
        self.expect(TokenKind::Semicolon, "`;`");
        self.done(m, NodeKind::DefaultNamespaceDecl);
    }

    /// `import module namespace p = "uri" at "loc", "loc";`
    fn parse_module_import(&mut self) {
        let m = self.start();
        self.bump(); // import
        self.bump(); // module
        if self.eat(TokenKind::KwNamespace) {
            if !self.eat_name_token() {
                self.error(DiagnosticKind::ExpectedName);
                self.missing("expected a namespace prefix");
            }
            self.expect(TokenKind::Equals, "`=`");
        }
        self.expect(TokenKind::StringLiteral, "a module URI");
        if self.eat(TokenKind::KwAt) {
            self.expect(TokenKind::StringLiteral, "a location URI");
            while self.eat(TokenKind::Comma) {
                self.expect(TokenKind::StringLiteral, "a location URI");
            }
        }
        self.expect(TokenKind::Semicolon, "`;`");
        self.done(m, NodeKind::ModuleImport);
    }

    /// `import schema namespace p = "uri" at "loc";` or
    /// `import schema default element namespace "uri";`
    fn parse_schema_import(&mut self) {
        let m = self.start();
        self.bump(); // import
        self.bump(); // schema
        if self.eat(TokenKind::KwNamespace) {
            if !self.eat_name_token() {
                self.error(DiagnosticKind::ExpectedName);
                self.missing("expected a namespace prefix");
            }
            self.expect(TokenKind::Equals, "`=`");
        } else if self.eat(TokenKind::KwDefault) {
            self.expect(TokenKind::KwElement, "`element`");
            self.expect(TokenKind::KwNamespace, "`namespace`");
        }
        self.expect(TokenKind::StringLiteral, "a schema URI");
        if self.eat(TokenKind::KwAt) {
            self.expect(TokenKind::StringLiteral, "a location URI");
            while self.eat(TokenKind::Comma) {
                self.expect(TokenKind::StringLiteral, "a location URI");
            }
        }
        self.expect(TokenKind::Semicolon, "`;`");
        self.done(m, NodeKind::SchemaImport);
    }

    /// `declare option ns:name "value";`
    fn parse_option_decl(&mut self) {
        let m = self.start();
        self.bump(); // declare
        self.bump(); // option
        self.parse_eqname_or_error();
        self.expect(TokenKind::StringLiteral, "an option value");
        self.expect(TokenKind::Semicolon, "`;`");
        self.done(m, NodeKind::OptionDecl);
    }

    /// `declare context item as item() := expr;`
    fn parse_context_item_decl(&mut self) {
        let m = self.start();
        self.bump(); // declare
        self.bump(); // context
        self.expect(TokenKind::KwItem, "`item`");
        if self.at(TokenKind::KwAs) {
            self.parse_type_declaration();
        }
        if self.eat(TokenKind::ColonEquals) {
            self.parse_expr_single_or_error();
        } else if self.eat(TokenKind::KwExternal) && self.eat(TokenKind::ColonEquals) {
            self.parse_expr_single_or_error();
        }
        self.expect(TokenKind::Semicolon, "`;`");
        self.done(m, NodeKind::ContextItemDecl);
    }

    /// Variable and function declarations share the annotation prefix:
    /// `declare %private %ns:ann("x") variable ...`
    fn parse_annotated_decl(&mut self) {
        let m = self.start();
        self.bump(); // declare
        while self.at(TokenKind::Percent) {
            self.parse_annotation();
        }
        match self.current() {
            TokenKind::KwVariable => {
                self.parse_var_decl_tail();
                self.done(m, NodeKind::VarDecl);
            }
            TokenKind::KwFunction => {
                self.parse_function_decl_tail();
                self.done(m, NodeKind::FunctionDecl);
            }
            _ => {
                self.error_recover(
                    DiagnosticKind::UnexpectedToken,
                    "expected `variable` or `function`",
                    PROLOG_RECOVERY,
                );
                self.eat(TokenKind::Semicolon);
                self.done(m, NodeKind::Error);
            }
        }
    }

    pub(super) fn parse_annotation(&mut self) {
        let m = self.start();
        self.bump(); // %
        self.parse_eqname_or_error();
        if self.eat(TokenKind::ParenOpen) {
            self.parse_annotation_literal();
            while self.eat(TokenKind::Comma) {
                self.parse_annotation_literal();
            }
            self.expect(TokenKind::ParenClose, "`)`");
        }
        self.done(m, NodeKind::Annotation);
    }

    fn parse_annotation_literal(&mut self) {
        match self.current() {
            TokenKind::StringLiteral
            | TokenKind::IntegerLiteral
            | TokenKind::DecimalLiteral
            | TokenKind::DoubleLiteral => {
                let m = self.start();
                self.bump();
                self.done(m, NodeKind::Literal);
            }
            _ => {
                self.error_msg(DiagnosticKind::UnexpectedToken, "expected a literal");
            }
        }
    }

    /// `variable $name as type := expr;` (or `external`)
    fn parse_var_decl_tail(&mut self) {
        self.bump(); // variable
        self.expect(TokenKind::Dollar, "`$`");
        self.parse_eqname_or_error();
        if self.at(TokenKind::KwAs) {
            self.parse_type_declaration();
        }
        if self.eat(TokenKind::ColonEquals) {
            self.parse_expr_single_or_error();
        } else if self.eat(TokenKind::KwExternal) {
            if self.eat(TokenKind::ColonEquals) {
                self.parse_expr_single_or_error();
            }
        } else {
            self.error_msg(
                DiagnosticKind::UnexpectedToken,
                "expected `:=` or `external`",
            );
        }
        self.expect(TokenKind::Semicolon, "`;`");
    }

    /// `function name(params) as type { body };` (or `external;`)
    fn parse_function_decl_tail(&mut self) {
        self.bump(); // function
        self.parse_eqname_or_error();
        self.push_delimiter();
        let open_range = self.current_span();
        let had_paren = self.expect(TokenKind::ParenOpen, "`(`");
        if self.at(TokenKind::Dollar) {
            self.parse_param_list();
        }
        if !self.eat(TokenKind::ParenClose) {
            if had_paren {
                self.error_unclosed_delimiter(
                    DiagnosticKind::UnclosedParen,
                    "parameter list opened here",
                    open_range,
                );
            }
            self.missing("expected `)`");
        }
        self.pop_delimiter();
        if self.at(TokenKind::KwAs) {
            self.parse_type_declaration();
        }
        if self.at(TokenKind::BraceOpen) {
            self.parse_enclosed_expr();
        } else if !self.eat(TokenKind::KwExternal) {
            self.error_msg(
                DiagnosticKind::UnexpectedToken,
                "expected a function body or `external`",
            );
            self.missing("expected a function body");
        }
        self.expect(TokenKind::Semicolon, "`;`");
    }

    pub(super) fn parse_param_list(&mut self) {
        let m = self.start();
        self.parse_param();
        while self.eat(TokenKind::Comma) {
            self.parse_param();
        }
        self.done(m, NodeKind::ParamList);
    }

    fn parse_param(&mut self) {
        let m = self.start();
        if !self.eat(TokenKind::Dollar) {
            self.error_msg(DiagnosticKind::ExpectedName, "expected `$param`");
            self.abandon(m);
            return;
        }
        self.parse_eqname_or_error();
        if self.at(TokenKind::KwAs) {
            self.parse_type_declaration();
        }
        self.done(m, NodeKind::Param);
    }

    fn parse_query_body(&mut self) {
        let m = self.start();
        self.parse_expr();
        self.done(m, NodeKind::QueryBody);
    }
}
