use action_publisher::csv::CsvActionSource;
use action_publisher::types::{ActionCodec, SEQUENCE_NUM_ATTRIBUTE};
use action_publisher::{CreateTopicArgs, DrainStrategyArg, PublishArgs, DEFAULT_TOPIC};
use clap::Parser;
use publisher_core::{DrainStrategy, DEFAULT_PROGRESS_INTERVAL};
use std::time::Duration;

#[derive(Parser)]
struct PublishCli {
    #[command(flatten)]
    args: PublishArgs,
}

#[derive(Parser)]
struct CreateTopicCli {
    #[command(flatten)]
    args: CreateTopicArgs,
}

fn parse_publish(extra: &[&str]) -> PublishArgs {
    let mut argv = vec!["action-publisher", "--brokers", "broker:9092", "--source", "a.csv"];
    argv.extend_from_slice(extra);
    PublishCli::try_parse_from(argv).unwrap().args
}

#[test]
fn test_publish_defaults() {
    let args = parse_publish(&[]);

    assert_eq!(args.kafka.brokers, "broker:9092");
    assert_eq!(args.kafka.topic, DEFAULT_TOPIC);
    assert!(!args.ordered);
    assert!(!args.repeat);
    assert_eq!(args.drain_strategy, DrainStrategyArg::Poll);

    let config = args.publisher_config();
    assert!(!config.ordering_enabled);
    assert_eq!(config.message_limit, None);
    assert_eq!(config.progress_interval, DEFAULT_PROGRESS_INTERVAL);
    assert_eq!(config.extra_info_bytes, 0);
    assert_eq!(config.drain.poll_interval, Duration::from_secs(5));
    assert_eq!(config.drain.timeout, None);
    assert_eq!(config.drain.strategy, DrainStrategy::Poll);
}

#[test]
fn test_publish_flags_map_to_configs() {
    let args = parse_publish(&[
        "--topic",
        "actions",
        "--ordered",
        "--repeat",
        "--message-limit",
        "1000000",
        "--progress-interval",
        "500",
        "--extra-info-bytes",
        "1024",
        "--drain-poll-interval",
        "250ms",
        "--drain-timeout",
        "10m",
        "--drain-strategy",
        "notify",
        "--message-timeout-ms",
        "5000",
    ]);

    let config = args.publisher_config();
    assert!(config.ordering_enabled);
    assert_eq!(config.message_limit, Some(1_000_000));
    assert_eq!(config.progress_interval, 500);
    assert_eq!(config.extra_info_bytes, 1024);
    assert_eq!(config.drain.poll_interval, Duration::from_millis(250));
    assert_eq!(config.drain.timeout, Some(Duration::from_secs(600)));
    assert_eq!(config.drain.strategy, DrainStrategy::Notify);

    let producer = args.producer_config();
    assert_eq!(producer.brokers, "broker:9092");
    assert_eq!(producer.topic, "actions");
    assert!(producer.ordering_enabled);
    assert_eq!(producer.message_timeout_ms, 5000);

    let source = args.source_config().unwrap();
    assert!(source.repeat);
    assert_eq!(source.delimiter, b',');
}

#[test]
fn test_publish_requires_source() {
    let result = PublishCli::try_parse_from(["action-publisher", "--brokers", "b:9092"]);
    assert!(result.is_err());
}

#[test]
fn test_invalid_duration_is_rejected() {
    let result = PublishCli::try_parse_from([
        "action-publisher",
        "--source",
        "a.csv",
        "--drain-timeout",
        "soon",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_zero_drain_poll_interval_is_rejected() {
    let result = PublishCli::try_parse_from([
        "action-publisher",
        "--source",
        "a.csv",
        "--drain-poll-interval",
        "0ms",
    ]);
    assert!(result.is_err());

    let args = parse_publish(&["--drain-poll-interval", "1ms"]);
    assert_eq!(args.publisher_config().drain.poll_interval, Duration::from_millis(1));
}

#[test]
fn test_ordered_flag_keys_csv_actions_by_user() {
    let args = parse_publish(&["--ordered"]);
    let input = "user_id,action,item_id,price,timestamp\n u7 ,view,,,0\n";
    let mut source =
        CsvActionSource::from_reader(input.as_bytes(), args.source_config().unwrap()).unwrap();
    let action = source.next().unwrap();

    let codec = ActionCodec::new(args.publisher_config().ordering_enabled);
    let message = codec.encode(&action, 0);
    assert_eq!(message.ordering_key.as_ref().map(|k| k.as_str()), Some("u7"));
    assert_eq!(message.attributes[SEQUENCE_NUM_ATTRIBUTE], "0");
}

#[test]
fn test_non_ascii_delimiter_is_rejected() {
    let args = parse_publish(&["--delimiter", "§"]);
    assert!(args.source_config().is_err());

    let args = parse_publish(&["--delimiter", ";"]);
    assert_eq!(args.source_config().unwrap().delimiter, b';');
}

#[test]
fn test_create_topic_args() {
    let args = CreateTopicCli::try_parse_from([
        "action-publisher",
        "--brokers",
        "broker:9092",
        "--topic",
        "actions",
        "--partitions",
        "4",
    ])
    .unwrap()
    .args;

    assert_eq!(args.kafka.topic, "actions");
    assert_eq!(args.partitions, 4);
}
