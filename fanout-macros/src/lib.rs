mod utils;

use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Races several futures and runs the handler of the first one to finish.
///
/// Branches have the form `future => handler`, where `handler` is anything
/// callable with the future's output (usually a closure). Futures are polled
/// in the order they are written, so the first branch wins ties.
///
/// ```rust,ignore
/// let outcome = fanout::select!(
///     sleep(Duration::from_secs(10)) => |_| Wake::Elapsed,
///     token.cancelled() => |_| Wake::Cancelled,
/// );
/// ```
#[proc_macro]
pub fn select(input: TokenStream) -> TokenStream {
    let branches = utils::parse_select_branches(input);

    if branches.is_empty() {
        return "()".parse().unwrap();
    }

    let count = branches.len();
    let generics = (1..=count)
        .map(|i| format!("__T{i}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = String::from("{\n");

    out.push_str(&format!("enum __Winner<{generics}> {{\n"));
    for i in 1..=count {
        out.push_str(&format!("    __B{i}(__T{i}),\n"));
    }
    out.push_str("}\n");

    for (i, branch) in branches.iter().enumerate() {
        out.push_str(&format!(
            "let mut __b{} = ::std::boxed::Box::pin({});\n",
            i + 1,
            branch.future
        ));
    }

    out.push_str("let __winner = ::std::future::poll_fn(move |__cx| {\n");
    out.push_str("    use ::std::future::Future;\n");
    out.push_str("    use ::std::task::Poll;\n");
    for i in 1..=count {
        out.push_str(&format!(
            "    if let Poll::Ready(__v) = __b{i}.as_mut().poll(__cx) {{\n\
                     return Poll::Ready(__Winner::__B{i}(__v));\n\
                 }}\n"
        ));
    }
    out.push_str("    Poll::Pending\n");
    out.push_str("}).await;\n");

    out.push_str("match __winner {\n");
    for (i, branch) in branches.iter().enumerate() {
        out.push_str(&format!(
            "    __Winner::__B{}(__v) => ({})(__v),\n",
            i + 1,
            branch.handler
        ));
    }
    out.push_str("}\n}\n");

    out.parse().unwrap_or_else(|err| {
        utils::compile_error(&format!("select! expansion failed: {err}"))
    })
}

/// Runs an `async fn` test on a fresh Fanout runtime.
///
/// Accepts an optional `worker_threads = N` argument; by default the runtime
/// uses one worker per available CPU.
///
/// ```rust,ignore
/// #[fanout::test(worker_threads = 2)]
/// async fn sleeps() {
///     fanout::time::sleep(Duration::from_millis(5)).await;
/// }
/// ```
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let workers = match utils::parse_worker_threads(attr) {
        Ok(workers) => workers,
        Err(msg) => return utils::compile_error(&msg),
    };

    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    if let Some(pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        tokens.remove(pos);
    }

    let Some(body_pos) = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
    else {
        return utils::compile_error("#[fanout::test] expects a function body");
    };

    let body = match &tokens[body_pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let mut builder = String::from("::fanout::RuntimeBuilder::new()");
    if let Some(n) = workers {
        builder.push_str(&format!(".worker_threads({n})"));
    }

    let wrapped = format!(
        "{{
            let runtime = {builder}
                .build()
                .expect(\"failed to start the fanout runtime\");
            runtime.block_on(async move {{ {body} }});
        }}"
    );

    let wrapped = match wrapped.parse() {
        Ok(stream) => stream,
        Err(err) => return utils::compile_error(&format!("#[fanout::test] failed: {err}")),
    };
    tokens[body_pos] = TokenTree::Group(Group::new(Delimiter::Brace, wrapped));

    let mut out: Vec<TokenTree> = "#[test]".parse::<TokenStream>().unwrap().into_iter().collect();
    out.extend(tokens);

    out.into_iter().collect()
}
