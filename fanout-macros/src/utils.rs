use proc_macro::{TokenStream, TokenTree};

/// One `future => handler` arm of `select!`, kept as source text.
pub(crate) struct Branch {
    pub(crate) future: String,
    pub(crate) handler: String,
}

/// Splits a token stream on top-level commas.
///
/// Nested groups arrive as a single `TokenTree::Group`, so commas inside
/// closures or calls are never split on. Empty segments are dropped, which
/// makes trailing commas harmless.
pub(crate) fn split_top_level(input: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();

    for token in input {
        match &token {
            TokenTree::Punct(p) if p.as_char() == ',' => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(token),
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

/// Renders tokens back to source text.
pub(crate) fn render(tokens: &[TokenTree]) -> String {
    tokens.iter().cloned().collect::<TokenStream>().to_string()
}

/// Finds the first `=>` in a token slice.
fn arrow_at(tokens: &[TokenTree]) -> Option<usize> {
    tokens.windows(2).position(|pair| {
        matches!(
            pair,
            [TokenTree::Punct(a), TokenTree::Punct(b)] if a.as_char() == '=' && b.as_char() == '>'
        )
    })
}

/// Parses `select!` arms. Arms without an arrow or with an empty side are
/// skipped.
pub(crate) fn parse_select_branches(input: TokenStream) -> Vec<Branch> {
    split_top_level(input)
        .into_iter()
        .filter_map(|segment| {
            let arrow = arrow_at(&segment)?;
            let future = render(&segment[..arrow]);
            let handler = render(&segment[arrow + 2..]);

            if future.trim().is_empty() || handler.trim().is_empty() {
                return None;
            }

            Some(Branch { future, handler })
        })
        .collect()
}

/// Reads `worker_threads = N` from an attribute argument list.
///
/// Returns `Ok(None)` when the attribute is empty.
pub(crate) fn parse_worker_threads(attr: TokenStream) -> Result<Option<usize>, String> {
    let mut workers = None;

    for segment in split_top_level(attr) {
        let text = render(&segment);
        let Some((key, value)) = text.split_once('=') else {
            return Err(format!("unexpected attribute argument `{text}`"));
        };

        if key.trim() != "worker_threads" {
            return Err(format!("unknown attribute argument `{}`", key.trim()));
        }

        let n = value
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("worker_threads expects an integer, got `{}`", value.trim()))?;

        if n == 0 {
            return Err("worker_threads must be > 0".to_string());
        }

        workers = Some(n);
    }

    Ok(workers)
}

/// Builds a `compile_error!` invocation carrying `msg`.
pub(crate) fn compile_error(msg: &str) -> TokenStream {
    format!("compile_error!({msg:?});").parse().unwrap()
}
