use periodviz::error::LoadError;
use periodviz::load::{self, BubbleLayout, LongLayout, WideLayout};
use periodviz::{EntityId, Metrics, Period};

fn rows(text: &str) -> load::RawRows {
    load::read_csv(text.as_bytes()).unwrap()
}

#[test]
fn public_records_are_always_finite() {
    let r = rows(
        "Quarter,Netflix,Disney,Hulu\n\
         2020'Q1,\"5,767\",n/a,1\n\
         2020'Q2,NaN,inf,(2)\n\
         Q3'20,6436,,oops\n",
    );
    let s = load::wide(&r, &WideLayout::default()).unwrap();
    assert_eq!(s.num_periods(), 3);
    for &p in s.periods_sorted() {
        for rec in s.records_for(p) {
            assert!(rec.metrics.is_finite(), "{rec:?}");
        }
    }
    let q1 = Period::Quarter { year: 2020, quarter: 1 };
    assert_eq!(s.get(&EntityId::new("netflix"), q1), Some(&5767.0));
    let q2 = Period::Quarter { year: 2020, quarter: 2 };
    assert_eq!(s.get(&EntityId::new("Hulu"), q2), Some(&-2.0));
    assert!(s.get(&EntityId::new("Netflix"), q2).is_none());
}

#[test]
fn bubble_sections_are_merged_per_entity_and_period() {
    let r = rows(
        "Growth,A,B\n\
         2020,10%,5%\n\
         2021,12%,6%\n\
         \n\
         Margin,A,B\n\
         2020,20%,-3%\n\
         2021,22%,\n\
         \n\
         Revenue,A,B\n\
         2020,100,50\n\
         2021,120,60\n",
    );
    let s = load::bubble(&r, &BubbleLayout::default()).unwrap();
    let a = s.get(&"A".into(), Period::Year(2021)).unwrap();
    assert_eq!((a.growth, a.margin, a.revenue), (12.0, 22.0, 120.0));
    // B has no 2021 margin, so no 2021 record
    assert!(s.get(&"B".into(), Period::Year(2021)).is_none());
    assert!(s.get(&"B".into(), Period::Year(2020)).is_some());
}

#[test]
fn bubble_without_margin_section_is_a_structural_error() {
    let r = rows("Growth,A\n2020,1\nRevenue,A\n2020,5\n");
    let err = load::bubble(&r, &BubbleLayout::default()).unwrap_err();
    assert!(matches!(err, LoadError::MissingMarker(m) if m == "Margin"));
}

#[test]
fn long_layout_reads_tidy_rows() {
    let r = rows(
        "entity,period,value\n\
         A,2020,10\n\
         'B,2020,5\n\
         A,2021,x\n\
         A,2022,15\n",
    );
    let s = load::long(&r, &LongLayout::default()).unwrap();
    assert_eq!(s.len(), 3);
    assert_eq!(s.get(&"B".into(), Period::Year(2020)), Some(&5.0));
    // the 2021 row had no usable value
    assert_eq!(s.periods_sorted(), &[Period::Year(2020), Period::Year(2022)]);
}

#[test]
fn long_layout_requires_its_columns() {
    let r = rows("name,period,value\nA,2020,1\n");
    let err = load::long(&r, &LongLayout::default()).unwrap_err();
    assert!(matches!(err, LoadError::MissingColumn(c) if c == "entity"));
}

#[test]
fn empty_input_has_no_data() {
    let r = rows("Year,A\n2020,\n");
    assert!(matches!(
        load::wide(&r, &WideLayout::default()),
        Err(LoadError::NoData)
    ));
}
