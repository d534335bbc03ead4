use std::{io::Write, sync::Arc};

use anyhow::Context;
use forecast_core::{Field, FormSettings, Session, View, WeatherProvider};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::render;

/// One line read from the terminal.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    /// New value for the query field.
    Text(&'a str),
    Submit,
    Quit,
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim_end_matches(['\r', '\n']) {
            "/submit" | "/s" => Input::Submit,
            "/quit" | "/q" => Input::Quit,
            text => Input::Text(text),
        }
    }
}

/// Interactive form on stdin/stdout. Every line replaces the query and
/// restarts the quiet period; `/submit` looks up right away.
pub async fn run(
    provider: Arc<dyn WeatherProvider>,
    settings: FormSettings,
) -> anyhow::Result<()> {
    drive(provider, settings, tokio::io::stdin(), &mut std::io::stdout()).await
}

/// At end of input the form is left to settle, so piped input such as
/// `echo Madrid | forecast watch` still prints its result. `/quit` stops at once.
async fn drive<R, W>(
    provider: Arc<dyn WeatherProvider>,
    settings: FormSettings,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let (session, handle) = Session::new(provider, settings);
    let mut snapshots = session.subscribe();
    let task = session.spawn();

    writeln!(
        out,
        "Type a location and wait {} ms, or enter /submit to search now. /quit exits.",
        settings.quiet_period.as_millis()
    )?;

    let mut lines = BufReader::new(input).lines();
    let mut input_done = false;
    let mut last_rendered = String::new();

    loop {
        tokio::select! {
            line = lines.next_line(), if !input_done => {
                let Some(line) = line.context("Failed to read input")? else {
                    input_done = true;
                    handle.finish()?;
                    continue;
                };
                match Input::parse(&line) {
                    Input::Submit => handle.submit()?,
                    Input::Quit => break,
                    Input::Text(value) => handle.input_changed(Field::Query, value)?,
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let rendered = render::render(View::of(&snapshots.borrow_and_update()));
                if rendered != last_rendered {
                    write!(out, "{rendered}")?;
                    out.flush()?;
                    last_rendered = rendered;
                }
            }
        }
    }

    // The session may already be gone if the snapshot channel closed.
    let _ = handle.teardown();
    task.await.context("Form session task failed")?;
    Ok(())
}
