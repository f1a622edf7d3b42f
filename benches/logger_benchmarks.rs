//! Criterion benchmarks for snaplogger

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use snaplogger::prelude::*;

/// Sink that renders but keeps nothing, so only the engine is measured
struct NullAppender;

impl Appender for NullAppender {
    fn append(&mut self, text: &str, _entry: &LogEntry) -> Result<()> {
        black_box(text);
        Ok(())
    }

    fn appender_type(&self) -> &str {
        "null"
    }
}

fn null_logger(template: &str) -> Logger {
    let logger = Logger::new();
    logger.add_appender(
        AppenderHandle::new(NullAppender)
            .with_severity(SeverityLevel::TRACE)
            .with_format(Format::shared(template).unwrap()),
    );
    logger
}

// ============================================================================
// Logging Performance Benchmarks
// ============================================================================

fn bench_sync_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_logging");
    group.throughput(Throughput::Elements(1));

    let logger = null_logger("${severity}: ${message}");

    group.bench_function("info", |b| {
        b.iter(|| {
            logger.info(black_box("Info message"));
        });
    });

    group.bench_function("message_builder", |b| {
        b.iter(|| {
            logger
                .message(SeverityLevel::ERROR)
                .append("request ")
                .append(black_box(42))
                .add_field("user", "bench");
        });
    });

    group.bench_function("macro", |b| {
        b.iter(|| {
            snaplogger::snap_log_warning!(logger, "value {}", black_box(7));
        });
    });

    group.finish();
}

fn bench_async_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("async_logging");
    group.throughput(Throughput::Elements(1));

    let logger = null_logger("${severity}: ${message}");
    logger.set_asynchronous(true).unwrap();

    group.bench_function("info", |b| {
        b.iter(|| {
            logger.info(black_box("Async info message"));
        });
    });

    group.finish();
    logger.set_asynchronous(false).unwrap();
}

// ============================================================================
// Gate Benchmarks
// ============================================================================

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");
    group.throughput(Throughput::Elements(1));

    let logger = null_logger("${message}");
    logger
        .get_appender("null")
        .unwrap()
        .set_severity(SeverityLevel::ERROR);

    group.bench_function("filtered_out", |b| {
        b.iter(|| {
            logger.debug(black_box("This should be filtered"));
        });
    });

    group.bench_function("filtered_macro", |b| {
        b.iter(|| {
            snaplogger::snap_log_debug!(logger, "never formatted {}", black_box(1));
        });
    });

    group.bench_function("passed_through", |b| {
        b.iter(|| {
            logger.error(black_box("This should pass"));
        });
    });

    group.finish();
}

// ============================================================================
// Template Benchmarks
// ============================================================================

fn bench_templates(c: &mut Criterion) {
    let mut group = c.benchmark_group("templates");
    group.throughput(Throughput::Elements(1));

    let entry = LogEntry::new(SeverityLevel::WARNING, "disk usage above 90%");

    group.bench_function("compile_default", |b| {
        b.iter(|| Format::new(black_box(snaplogger::core::DEFAULT_FORMAT)).unwrap());
    });

    let simple = Format::new("${severity}: ${message}").unwrap();
    group.bench_function("render_simple", |b| {
        b.iter(|| simple.render(black_box(&entry)).unwrap());
    });

    let functions =
        Format::new("[${severity:upper:align=center:exact_width=12}] ${message:escape:max_width=40}")
            .unwrap();
    group.bench_function("render_functions", |b| {
        b.iter(|| functions.render(black_box(&entry)).unwrap());
    });

    let full = Format::new(snaplogger::core::DEFAULT_FORMAT).unwrap();
    group.bench_function("render_default", |b| {
        b.iter(|| full.render(black_box(&entry)).unwrap());
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_sync_logging,
    bench_async_logging,
    bench_level_filtering,
    bench_templates
);

criterion_main!(benches);
