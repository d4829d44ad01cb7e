use publisher_core::SessionReport;
use std::fmt::Write;

/// Human-readable end-of-run summary.
pub fn format_summary(report: &SessionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Dispatched:  {}", report.stats.dispatched);
    let _ = writeln!(out, "Succeeded:   {}", report.succeeded);
    let _ = writeln!(out, "Failed:      {}", report.failed);
    let _ = writeln!(out, "Elapsed:     {:.3}s", report.stats.elapsed.as_secs_f64());
    let _ = writeln!(
        out,
        "Throughput:  {:.1} msg/s",
        report.stats.messages_per_second()
    );
    let _ = write!(out, "Drain:       {}", report.drain);
    if let Some(err) = &report.close_error {
        let _ = write!(out, "\nClose error: {err}");
    }
    out
}
