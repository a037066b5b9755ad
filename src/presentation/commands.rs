//! One-shot commands that print to a writer instead of connecting to Discord.

use std::io::{self, Write};

use thiserror::Error;

use crate::application::TransformRegistry;
use crate::application::use_cases::{CheckError, CheckLinksUseCase, CheckRequest};

/// Failure of a one-shot command.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum CommandError {
    #[error(transparent)]
    Check(#[from] CheckError),
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Prints registered transform names, one per line, in matching order.
///
/// # Errors
/// Returns error if `out` cannot be written.
pub fn list_transforms(registry: &TransformRegistry, out: &mut impl Write) -> io::Result<()> {
    for name in registry.names() {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

/// Rewrites `request.text` and prints which transforms ran and the result.
///
/// # Errors
/// Returns error for an unknown or failing named transform, or if `out`
/// cannot be written.
pub async fn check_text(
    use_case: &CheckLinksUseCase,
    request: CheckRequest,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let report = use_case.execute(request).await?;

    if report.applied.is_empty() {
        writeln!(out, "no transform matched")?;
        return Ok(());
    }

    writeln!(out, "applied: {}", report.applied.join(", "))?;
    match report.output {
        Some(output) => writeln!(out, "{output}")?,
        None => writeln!(out, "(nothing rewritten)")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use regex::Regex;

    use super::*;
    use crate::application::transforms::Substitute;

    fn registry() -> Arc<TransformRegistry> {
        Arc::new(
            TransformRegistry::builder()
                .register(Substitute::new(
                    "twitter",
                    Regex::new(r"https?://(twitter|x)\.com/(\w+)/status(es)?/(\d+)").unwrap(),
                    "https://vxtwitter.com/$2/status/$4",
                ))
                .register(Substitute::new(
                    "youtube-shorts",
                    Regex::new(r"https?://(?:www\.)?youtube\.com/shorts/([\w-]+)").unwrap(),
                    "https://www.youtube.com/watch?v=$1",
                ))
                .build(),
        )
    }

    fn output(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_list_in_registration_order() {
        let mut out = Vec::new();
        list_transforms(&registry(), &mut out).unwrap();
        assert_eq!(output(out), "twitter\nyoutube-shorts\n");
    }

    #[tokio::test]
    async fn test_check_prints_rewrite() {
        let use_case = CheckLinksUseCase::new(registry());
        let mut out = Vec::new();

        check_text(
            &use_case,
            CheckRequest {
                text: "https://x.com/a/status/1".to_string(),
                transform: None,
            },
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(
            output(out),
            "applied: twitter\nhttps://vxtwitter.com/a/status/1\n"
        );
    }

    #[tokio::test]
    async fn test_check_without_match() {
        let use_case = CheckLinksUseCase::new(registry());
        let mut out = Vec::new();

        check_text(
            &use_case,
            CheckRequest {
                text: "hello".to_string(),
                transform: None,
            },
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(output(out), "no transform matched\n");
    }

    #[tokio::test]
    async fn test_check_unknown_transform() {
        let use_case = CheckLinksUseCase::new(registry());
        let mut out = Vec::new();

        let result = check_text(
            &use_case,
            CheckRequest {
                text: "hello".to_string(),
                transform: Some("myspace".to_string()),
            },
            &mut out,
        )
        .await;

        assert!(matches!(
            result,
            Err(CommandError::Check(CheckError::UnknownTransform { .. }))
        ));
        assert!(out.is_empty());
    }
}
