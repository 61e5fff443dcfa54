use crate::batch::dataset::InMemoryDataset;
use crate::batch::kwargs::BatchKwargs;
use crate::batch::markers::BatchMarkers;
use crate::suite::ExpectationSuite;

/// 로드된 배치: 데이터 + 가져온 방법(kwargs) + 가져온 결과(markers)
///
/// 배치를 만든 검증 실행이 소유하며, validation operator가 소비한 뒤 버려집니다.
#[derive(Debug, Clone)]
pub struct Batch {
    pub datasource_name: String,
    pub expectation_suite: ExpectationSuite,
    pub batch_kwargs: BatchKwargs,
    pub batch_markers: BatchMarkers,
    pub data: InMemoryDataset,
}

impl Batch {
    pub fn new(
        datasource_name: impl Into<String>,
        expectation_suite: ExpectationSuite,
        batch_kwargs: BatchKwargs,
        batch_markers: BatchMarkers,
        data: InMemoryDataset,
    ) -> Self {
        Self {
            datasource_name: datasource_name.into(),
            expectation_suite,
            batch_kwargs,
            batch_markers,
            data,
        }
    }

    pub fn expectation_suite_name(&self) -> &str {
        &self.expectation_suite.expectation_suite_name
    }

    /// 배치 정의의 fingerprint
    pub fn batch_kwargs_fingerprint(&self) -> String {
        self.batch_kwargs.to_id()
    }

    /// 실제로 가져온 배치의 fingerprint
    pub fn batch_fingerprint(&self) -> String {
        self.batch_markers.to_id()
    }
}
