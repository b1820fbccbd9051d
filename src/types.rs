use std::fmt;

use rdkafka::topic_partition_list::TopicPartitionListElem;
use rdkafka::TopicPartitionList;

/// A single topic/partition pair, the unit of fan-out assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicPartition {
    topic: String,
    partition: i32,
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: i32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn partition(&self) -> i32 {
        self.partition
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.topic, self.partition)
    }
}

impl From<TopicPartitionListElem<'_>> for TopicPartition {
    fn from(elem: TopicPartitionListElem<'_>) -> Self {
        Self::new(elem.topic().to_string(), elem.partition())
    }
}

/// Build an rdkafka partition list from a subset of assigned partitions.
/// Workers use this to hand their assignment to the broker client.
pub fn to_partition_list(partitions: &[TopicPartition]) -> TopicPartitionList {
    let mut list = TopicPartitionList::with_capacity(partitions.len());
    for tp in partitions {
        list.add_partition(tp.topic(), tp.partition());
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let tp = TopicPartition::new("events", 3);
        assert_eq!(tp.to_string(), "events-3");
    }

    #[test]
    fn test_to_partition_list_preserves_all_entries() {
        let partitions = vec![
            TopicPartition::new("events", 0),
            TopicPartition::new("events", 1),
            TopicPartition::new("clicks", 0),
        ];

        let list = to_partition_list(&partitions);
        assert_eq!(list.count(), 3);
        assert!(list.find_partition("events", 1).is_some());
        assert!(list.find_partition("clicks", 0).is_some());
    }

    #[test]
    fn test_from_partition_list_elem() {
        let mut list = TopicPartitionList::new();
        list.add_partition("events", 7);

        let elem = list.elements().into_iter().next().unwrap();
        let tp = TopicPartition::from(elem);
        assert_eq!(tp, TopicPartition::new("events", 7));
    }
}
