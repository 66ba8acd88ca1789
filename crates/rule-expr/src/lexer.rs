//! 词法分析器
//!
//! 对 UTF-8 输入做单趟扫描，产出带字节位置的词法单元。注释
//! （`-- …` 与 `/* … */`）按空白处理；所有值字面量保留原始文本，
//! 供规则回打印使用。
//!
//! 数字、IP、CIDR 与十六进制串共享同一扫描入口：先取一段
//! `[0-9a-fA-F:.]` 连续串，再按内容分类。全部为两位十六进制组且
//! 以冒号分隔的串优先判定为十六进制串（MAC 形态），其余带冒号的
//! 串尝试按 IPv6 解析。

use crate::token::{Token, TokenKind};

pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    /// 全量扫描。遇到错误词法单元立即停止，结尾追加 Eof。
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let kind = token.kind;
            tokens.push(token);
            if kind == TokenKind::Eof || kind == TokenKind::Error {
                break;
            }
        }
        tokens
    }

    fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.pos;
        let Some(&c) = self.bytes.get(self.pos) else {
            return Token::new(TokenKind::Eof, "", self.src.len());
        };

        match c {
            b'(' => self.single(TokenKind::LParen, start),
            b')' => self.single(TokenKind::RParen, start),
            b'[' => self.single(TokenKind::LBracket, start),
            b']' => self.single(TokenKind::RBracket, start),
            b',' => self.single(TokenKind::Comma, start),

            b'=' => match self.bytes.get(self.pos + 1) {
                Some(b'=') => self.multi(TokenKind::Eq, start, 2),
                Some(b'~') => self.multi(TokenKind::Matches, start, 2),
                _ => self.error_token(start),
            },
            b'!' => match self.bytes.get(self.pos + 1) {
                Some(b'=') => self.multi(TokenKind::Ne, start, 2),
                _ => self.single(TokenKind::Not, start),
            },
            b'>' => match self.bytes.get(self.pos + 1) {
                Some(b'=') => self.multi(TokenKind::Ge, start, 2),
                _ => self.single(TokenKind::Gt, start),
            },
            b'<' => match self.bytes.get(self.pos + 1) {
                Some(b'=') => self.multi(TokenKind::Le, start, 2),
                _ => self.single(TokenKind::Lt, start),
            },
            b'&' => match self.bytes.get(self.pos + 1) {
                Some(b'&') => self.multi(TokenKind::And, start, 2),
                _ => self.error_token(start),
            },
            b'|' => match self.bytes.get(self.pos + 1) {
                Some(b'|') => self.multi(TokenKind::Or, start, 2),
                _ => self.lex_regex(b'|', start),
            },
            b'/' => self.lex_regex(b'/', start),

            b'"' | b'\'' => self.lex_string(c, start),

            b'+' | b'-' => self.lex_signed_number(start),
            b'0'..=b'9' | b':' => self.lex_numeric(start),

            b'a'..=b'f' | b'A'..=b'F' => {
                // 十六进制字母开头：可能是 MAC/IPv6，也可能是普通标识符
                if let Some(token) = self.try_lex_host(start) {
                    token
                } else {
                    self.lex_ident(start)
                }
            }
            b'g'..=b'z' | b'G'..=b'Z' | b'_' => self.lex_ident(start),

            _ => self.error_token(start),
        }
    }

    /// 跳过空白与注释
    fn skip_trivia(&mut self) {
        loop {
            match self.bytes.get(self.pos) {
                Some(b' ' | b'\t' | b'\r' | b'\n') => self.pos += 1,
                Some(b'-') if self.bytes.get(self.pos + 1) == Some(&b'-') => {
                    while let Some(&c) = self.bytes.get(self.pos) {
                        self.pos += 1;
                        if c == b'\n' {
                            break;
                        }
                    }
                }
                Some(b'/') if self.bytes.get(self.pos + 1) == Some(&b'*') => {
                    self.pos += 2;
                    while self.pos < self.bytes.len() {
                        if self.bytes[self.pos] == b'*'
                            && self.bytes.get(self.pos + 1) == Some(&b'/')
                        {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => return,
            }
        }
    }

    fn single(&mut self, kind: TokenKind, start: usize) -> Token {
        self.pos += 1;
        Token::new(kind, &self.src[start..self.pos], start)
    }

    fn multi(&mut self, kind: TokenKind, start: usize, len: usize) -> Token {
        self.pos += len;
        Token::new(kind, &self.src[start..self.pos], start)
    }

    fn error_token(&mut self, start: usize) -> Token {
        Token::new(TokenKind::Error, &self.src[start..start + 1], start)
    }

    /// 正则字面量：`/…/` 或 `|…|`，另一种分隔符在内部按普通字符处理
    fn lex_regex(&mut self, delim: u8, start: usize) -> Token {
        self.pos += 1;
        while let Some(&c) = self.bytes.get(self.pos) {
            if c == b'\\' {
                self.pos += 2;
                continue;
            }
            if c == delim {
                self.pos += 1;
                return Token::new(TokenKind::Regex, &self.src[start..self.pos], start);
            }
            self.pos += 1;
        }
        // 未闭合
        self.pos = self.bytes.len();
        Token::new(TokenKind::Error, &self.src[start..start + 1], start)
    }

    fn lex_string(&mut self, quote: u8, start: usize) -> Token {
        self.pos += 1;
        while let Some(&c) = self.bytes.get(self.pos) {
            if c == b'\\' {
                self.pos += 2;
                continue;
            }
            if c == quote {
                self.pos += 1;
                return Token::new(TokenKind::String, &self.src[start..self.pos], start);
            }
            self.pos += 1;
        }
        self.pos = self.bytes.len();
        Token::new(TokenKind::Error, &self.src[start..start + 1], start)
    }

    /// 带符号数字：`+`/`-` 后只接受十进制整数或浮点数
    fn lex_signed_number(&mut self, start: usize) -> Token {
        if !matches!(self.bytes.get(self.pos + 1), Some(b'0'..=b'9')) {
            return self.error_token(start);
        }
        self.pos += 1;
        self.lex_decimal(start)
    }

    fn lex_decimal(&mut self, start: usize) -> Token {
        while matches!(self.bytes.get(self.pos), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.bytes.get(self.pos) == Some(&b'.')
            && matches!(self.bytes.get(self.pos + 1), Some(b'0'..=b'9'))
        {
            self.pos += 1;
            while matches!(self.bytes.get(self.pos), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
            return Token::new(TokenKind::Float, &self.src[start..self.pos], start);
        }
        Token::new(TokenKind::Int, &self.src[start..self.pos], start)
    }

    /// 数字 / IP / CIDR / 十六进制串家族
    fn lex_numeric(&mut self, start: usize) -> Token {
        // 进制前缀整数
        if self.bytes[self.pos] == b'0' {
            if let Some(&r) = self.bytes.get(self.pos + 1) {
                if matches!(r, b'x' | b'X' | b'o' | b'O' | b'b' | b'B')
                    && self
                        .bytes
                        .get(self.pos + 2)
                        .is_some_and(|c| c.is_ascii_hexdigit())
                {
                    self.pos += 2;
                    while self
                        .bytes
                        .get(self.pos)
                        .is_some_and(|c| c.is_ascii_hexdigit())
                    {
                        self.pos += 1;
                    }
                    return Token::new(TokenKind::Int, &self.src[start..self.pos], start);
                }
            }
        }

        match self.try_lex_host(start) {
            Some(token) => token,
            None => {
                let run = self.scan_host_run(start);
                self.pos = start + run.len();
                Token::new(TokenKind::Error, &self.src[start..start + 1], start)
            }
        }
    }

    /// 尝试把一段 `[0-9a-fA-F:.]` 串识别为整数/浮点/IP/CIDR/十六进制串。
    /// 失败时不移动位置，调用方可回退到标识符扫描。
    fn try_lex_host(&mut self, start: usize) -> Option<Token> {
        let run = self.scan_host_run(start);
        if run.is_empty() {
            return None;
        }
        let end = start + run.len();

        let kind = classify_host_run(run)?;
        match kind {
            HostKind::Int => {
                self.pos = end;
                Some(Token::new(TokenKind::Int, run, start))
            }
            HostKind::Float => {
                self.pos = end;
                Some(Token::new(TokenKind::Float, run, start))
            }
            HostKind::Hex => {
                self.pos = end;
                Some(Token::new(TokenKind::HexString, run, start))
            }
            HostKind::Ip => {
                self.pos = end;
                // `/mask` 后缀升级为 CIDR
                if self.bytes.get(self.pos) == Some(&b'/')
                    && matches!(self.bytes.get(self.pos + 1), Some(b'0'..=b'9'))
                {
                    self.pos += 1;
                    while matches!(self.bytes.get(self.pos), Some(b'0'..=b'9')) {
                        self.pos += 1;
                    }
                    return Some(Token::new(
                        TokenKind::IpCidr,
                        &self.src[start..self.pos],
                        start,
                    ));
                }
                Some(Token::new(TokenKind::Ip, run, start))
            }
        }
    }

    fn scan_host_run(&self, start: usize) -> &'a str {
        let mut end = start;
        while let Some(&c) = self.bytes.get(end) {
            if c.is_ascii_hexdigit() || c == b':' || c == b'.' {
                end += 1;
            } else {
                break;
            }
        }
        &self.src[start..end]
    }

    fn lex_ident(&mut self, start: usize) -> Token {
        while let Some(&c) = self.bytes.get(self.pos) {
            if c.is_ascii_alphanumeric() || matches!(c, b'_' | b'.' | b'-') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let raw = &self.src[start..self.pos];

        let kind = match raw.to_ascii_lowercase().as_str() {
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "in" => TokenKind::In,
            "contains" => TokenKind::Contains,
            "matches" => TokenKind::Matches,
            "eq" => TokenKind::Eq,
            "ne" => TokenKind::Ne,
            "lt" => TokenKind::Lt,
            "le" => TokenKind::Le,
            "gt" => TokenKind::Gt,
            "ge" => TokenKind::Ge,
            "true" | "false" => TokenKind::Bool,
            _ => TokenKind::Field,
        };
        Token::new(kind, raw, start)
    }
}

enum HostKind {
    Int,
    Float,
    Hex,
    Ip,
}

/// 对连续串分类；None 表示这段内容应回退给标识符扫描
fn classify_host_run(run: &str) -> Option<HostKind> {
    let has_colon = run.contains(':');
    let has_dot = run.contains('.');

    if has_colon {
        // 全部两位十六进制组：MAC / 字节串
        if !has_dot {
            let groups: Vec<&str> = run.split(':').collect();
            if groups.len() >= 2
                && groups
                    .iter()
                    .all(|g| g.len() == 2 && g.bytes().all(|b| b.is_ascii_hexdigit()))
            {
                return Some(HostKind::Hex);
            }
        }
        if run.parse::<std::net::Ipv6Addr>().is_ok() {
            return Some(HostKind::Ip);
        }
        return None;
    }

    if has_dot {
        if run.parse::<std::net::Ipv4Addr>().is_ok() {
            return Some(HostKind::Ip);
        }
        let (int_part, frac_part) = run.split_once('.')?;
        if !int_part.is_empty()
            && !frac_part.is_empty()
            && int_part.bytes().all(|b| b.is_ascii_digit())
            && frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Some(HostKind::Float);
        }
        return None;
    }

    if run.bytes().all(|b| b.is_ascii_digit()) {
        return Some(HostKind::Int);
    }

    // 含字母的裸十六进制串：偶数长度且以数字开头（如 504f5354）
    if run.len() % 2 == 0 && run.as_bytes()[0].is_ascii_digit() {
        return Some(HostKind::Hex);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().iter().map(|t| t.kind).collect()
    }

    fn raws(src: &str) -> Vec<String> {
        Lexer::new(src)
            .tokenize()
            .iter()
            .map(|t| t.raw.clone())
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("port == 8080"),
            vec![TokenKind::Field, TokenKind::Eq, TokenKind::Int, TokenKind::Eof]
        );
        assert_eq!(
            kinds("a && b || !c"),
            vec![
                TokenKind::Field,
                TokenKind::And,
                TokenKind::Field,
                TokenKind::Or,
                TokenKind::Not,
                TokenKind::Field,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(
            kinds("a AND b Or NOT c"),
            vec![
                TokenKind::Field,
                TokenKind::And,
                TokenKind::Field,
                TokenKind::Or,
                TokenKind::Not,
                TokenKind::Field,
                TokenKind::Eof
            ]
        );
        assert_eq!(kinds("TRUE"), vec![TokenKind::Bool, TokenKind::Eof]);
        assert_eq!(
            kinds("a eq 1 and b ne 2"),
            vec![
                TokenKind::Field,
                TokenKind::Eq,
                TokenKind::Int,
                TokenKind::And,
                TokenKind::Field,
                TokenKind::Ne,
                TokenKind::Int,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_keyword_not_part_of_identifier() {
        // "contains_x" 是字段名而不是操作符
        assert_eq!(kinds("contains_x"), vec![TokenKind::Field, TokenKind::Eof]);
        assert_eq!(kinds("android"), vec![TokenKind::Field, TokenKind::Eof]);
    }

    #[test]
    fn test_dotted_field_is_one_token() {
        let tokens = Lexer::new("src.process.path == 'x'").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Field);
        assert_eq!(tokens[0].raw, "src.process.path");
    }

    #[test]
    fn test_number_family() {
        assert_eq!(kinds("42"), vec![TokenKind::Int, TokenKind::Eof]);
        assert_eq!(kinds("-42"), vec![TokenKind::Int, TokenKind::Eof]);
        assert_eq!(kinds("+1"), vec![TokenKind::Int, TokenKind::Eof]);
        assert_eq!(kinds("1.35"), vec![TokenKind::Float, TokenKind::Eof]);
        assert_eq!(kinds("0x1F"), vec![TokenKind::Int, TokenKind::Eof]);
        assert_eq!(kinds("0b101"), vec![TokenKind::Int, TokenKind::Eof]);
        assert_eq!(
            kinds("18446744073709551615"),
            vec![TokenKind::Int, TokenKind::Eof]
        );
    }

    #[test]
    fn test_ip_and_cidr() {
        assert_eq!(kinds("192.168.1.1"), vec![TokenKind::Ip, TokenKind::Eof]);
        assert_eq!(
            kinds("192.168.0.0/16"),
            vec![TokenKind::IpCidr, TokenKind::Eof]
        );
        assert_eq!(kinds("::1"), vec![TokenKind::Ip, TokenKind::Eof]);
        assert_eq!(kinds("2001:db8::1"), vec![TokenKind::Ip, TokenKind::Eof]);
        assert_eq!(
            kinds("2001:db8::1/64"),
            vec![TokenKind::IpCidr, TokenKind::Eof]
        );
        assert_eq!(
            kinds("2001:db8:3333:4444:5555:6666:1.2.3.4"),
            vec![TokenKind::Ip, TokenKind::Eof]
        );
    }

    #[test]
    fn test_hex_string() {
        assert_eq!(kinds("47:45:54"), vec![TokenKind::HexString, TokenKind::Eof]);
        assert_eq!(
            kinds("01:23:45:67:89:ab"),
            vec![TokenKind::HexString, TokenKind::Eof]
        );
        // 8 组两位十六进制：按硬件地址处理而不是 IPv6
        assert_eq!(
            kinds("01:23:45:67:89:ab:cd:ef"),
            vec![TokenKind::HexString, TokenKind::Eof]
        );
        // 裸偶数长度十六进制（数字开头）
        assert_eq!(kinds("504f5354"), vec![TokenKind::HexString, TokenKind::Eof]);
        // 字母开头且无冒号的按标识符处理
        assert_eq!(kinds("deadbeef"), vec![TokenKind::Field, TokenKind::Eof]);
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(kinds(r#""domain.com""#), vec![TokenKind::String, TokenKind::Eof]);
        assert_eq!(kinds("'single'"), vec![TokenKind::String, TokenKind::Eof]);
        assert_eq!(
            kinds(r#""with \" escape""#),
            vec![TokenKind::String, TokenKind::Eof]
        );
        assert_eq!(kinds("\"unclosed"), vec![TokenKind::Error]);
    }

    #[test]
    fn test_regex_literals() {
        assert_eq!(
            kinds(r"/example\.com$/"),
            vec![TokenKind::Regex, TokenKind::Eof]
        );
        assert_eq!(kinds("|some/path/here|"), vec![TokenKind::Regex, TokenKind::Eof]);
        assert_eq!(
            raws(r"/gl=se$/")[0],
            r"/gl=se$/"
        );
        assert_eq!(kinds("/unclosed"), vec![TokenKind::Error]);
    }

    #[test]
    fn test_comments_are_whitespace() {
        assert_eq!(
            kinds("a == 1 -- trailing comment"),
            vec![TokenKind::Field, TokenKind::Eq, TokenKind::Int, TokenKind::Eof]
        );
        assert_eq!(
            kinds("a /* inline */ == 1"),
            vec![TokenKind::Field, TokenKind::Eq, TokenKind::Int, TokenKind::Eof]
        );
        assert_eq!(
            kinds("f_mac == 01:23:45:67:89:ab --or more"),
            vec![
                TokenKind::Field,
                TokenKind::Eq,
                TokenKind::HexString,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_positions_are_byte_offsets() {
        let tokens = Lexer::new("ab == 12").tokenize();
        assert_eq!(tokens[0].pos, 0);
        assert_eq!(tokens[1].pos, 3);
        assert_eq!(tokens[2].pos, 6);
        assert_eq!(tokens[2].len, 2);
        // Eof 落在输入末尾
        assert_eq!(tokens[3].pos, 8);
    }

    #[test]
    fn test_error_tokens() {
        assert_eq!(kinds("??"), vec![TokenKind::Error]);
        assert_eq!(kinds("a == %1"), vec![TokenKind::Field, TokenKind::Eq, TokenKind::Error]);
        // 单个 & 不是合法操作符
        assert_eq!(kinds("a & b"), vec![TokenKind::Field, TokenKind::Error]);
    }

    #[test]
    fn test_matches_operator() {
        assert_eq!(
            kinds(r"domain =~ /x/"),
            vec![TokenKind::Field, TokenKind::Matches, TokenKind::Regex, TokenKind::Eof]
        );
        assert_eq!(
            kinds(r"domain matches /x/"),
            vec![TokenKind::Field, TokenKind::Matches, TokenKind::Regex, TokenKind::Eof]
        );
    }
}
