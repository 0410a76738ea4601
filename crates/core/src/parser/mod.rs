//! The two passes over a beatmap source.
//!
//! The header pass reads metadata, difficulty, events and raw timing points
//! and materialises the timing structure. The object pass re-reads the
//! source for `[HitObjects]` only and depends on that timing structure, so it
//! must not run unless the header pass succeeded.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use tracing::{debug, info};

use crate::{
    config::{ComboNumbering, ParserConfig},
    lexer::{lossy_lines, tokenize, Section, SectionTracker, LIST_DELIMITER},
    mapping,
    objects::{HitObject, ObjectFactory, StandardObjectFactory},
    stacking::{StackResolver, StandardStackResolver},
    timing::{StandardTimingLoader, TimingLoader},
    BeatMap, BeatmapError, Result,
};

/// Drives both passes with a set of pluggable collaborators.
pub struct BeatmapParser {
    config: ParserConfig,
    loader: Box<dyn TimingLoader>,
    factory: Box<dyn ObjectFactory>,
    stacker: Box<dyn StackResolver>,
}

impl Default for BeatmapParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl BeatmapParser {
    /// Creates a parser using the standard osu! collaborators.
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            loader: Box::new(StandardTimingLoader),
            factory: Box::new(StandardObjectFactory),
            stacker: Box::new(StandardStackResolver),
        }
    }

    pub fn with_timing_loader(mut self, loader: impl TimingLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn with_object_factory(mut self, factory: impl ObjectFactory + 'static) -> Self {
        self.factory = Box::new(factory);
        self
    }

    pub fn with_stack_resolver(mut self, stacker: impl StackResolver + 'static) -> Self {
        self.stacker = Box::new(stacker);
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Runs the header pass on the file at `path`, resolved against the
    /// configured songs directory.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<BeatMap> {
        let mut beatmap = BeatMap::from_path(self.config.resolve(path.as_ref()));
        self.parse_header(&mut beatmap)?;
        Ok(beatmap)
    }

    /// Runs both passes on the file at `path`.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<BeatMap> {
        let mut beatmap = self.open(path)?;
        self.parse_objects(&mut beatmap)?;
        Ok(beatmap)
    }

    pub fn parse_header(&self, beatmap: &mut BeatMap) -> Result<()> {
        let reader = open_source(&beatmap.path)?;
        self.parse_header_from(reader, beatmap)
    }

    pub fn parse_objects(&self, beatmap: &mut BeatMap) -> Result<()> {
        let reader = open_source(&beatmap.path)?;
        self.parse_objects_from(reader, beatmap)
    }

    /// Header pass over any line source. Expects a freshly created model:
    /// string fields such as the audio file and background are appended to.
    pub fn parse_header_from<R: BufRead>(&self, reader: R, beatmap: &mut BeatMap) -> Result<()> {
        let mut tracker = SectionTracker::new();

        for line in lossy_lines(reader) {
            let line = line?;
            if tracker.observe(&line) {
                continue;
            }

            let section = tracker.current();
            if matches!(section, Section::HitObjects | Section::Unknown) {
                continue;
            }
            let fields = tokenize(&line, section.delimiter());
            if fields.len() < 2 {
                continue;
            }

            match section {
                Section::General => mapping::map_general(&fields, beatmap)?,
                Section::Metadata => mapping::map_metadata(&fields, beatmap),
                Section::Difficulty => mapping::map_difficulty(&fields, beatmap),
                Section::Events => mapping::map_events(&fields, beatmap),
                Section::TimingPoints => mapping::map_timing_point(&line, beatmap),
                Section::HitObjects | Section::Unknown => {}
            }
        }

        self.loader
            .load(&beatmap.timing_points_text, &mut beatmap.timings);
        beatmap.timings.mark_loaded();

        if beatmap.is_anonymous() || beatmap.timing_points_text.is_empty() {
            return Err(BeatmapError::CorruptedSource {
                path: beatmap.path.clone(),
            });
        }

        info!(
            title = %beatmap.name,
            version = %beatmap.difficulty_name,
            timing_points = beatmap.timings.points().len(),
            breaks = beatmap.pauses.len(),
            "parsed beatmap header"
        );
        Ok(())
    }

    /// Object pass over any line source. The model must have gone through a
    /// successful header pass.
    pub fn parse_objects_from<R: BufRead>(&self, reader: R, beatmap: &mut BeatMap) -> Result<()> {
        if !beatmap.timings.is_loaded() {
            return Err(BeatmapError::msg(
                "object pass requires a completed header pass",
            ));
        }

        let mut objects: Vec<HitObject> = beatmap.pauses.iter().map(HitObject::from).collect();
        let mut tracker = SectionTracker::new();
        let mut dropped = 0usize;

        for line in lossy_lines(reader) {
            let line = line?;
            if tracker.observe(&line) || tracker.current() != Section::HitObjects {
                continue;
            }

            let fields = tokenize(&line, LIST_DELIMITER);
            if fields.is_empty() {
                continue;
            }
            match self.factory.build(&fields) {
                Some(object) => objects.push(object),
                None => {
                    dropped += 1;
                    debug!(line = %line, "dropping unsupported hit object");
                }
            }
        }

        // Stable, so ties keep their input order.
        objects.sort_by_key(|object| object.start_time);
        assign_numbers(&mut objects, self.config.combo_numbering);

        for object in &mut objects {
            object.set_timing(&beatmap.timings);
        }
        if self.config.stacking {
            self.stacker
                .resolve(&mut objects, &beatmap.difficulty, beatmap.stack_leniency);
        }

        beatmap.hit_objects = objects;
        info!(
            objects = beatmap.hit_objects.len(),
            dropped, "parsed beatmap objects"
        );
        Ok(())
    }
}

fn open_source(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| BeatmapError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })
}

/// Gives every non-pause object its global index, combo number and combo set.
fn assign_numbers(objects: &mut [HitObject], policy: ComboNumbering) {
    let mut pending_reset = policy == ComboNumbering::ImplicitFirstReset;
    let mut combo_number = 1;
    let mut combo_set = 0;

    for (number, object) in objects.iter_mut().filter(|o| !o.is_pause()).enumerate() {
        if object.new_combo || pending_reset {
            combo_number = 1;
            combo_set += 1;
            pending_reset = false;
        }

        object.number = Some(number);
        object.combo_number = Some(combo_number);
        object.combo_set = Some(combo_set);
        combo_number += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::objects::{ObjectKind, Vec2};

    const HEADER: &str = "osu file format v14

[General]
AudioFilename: audio.mp3
Mode: 0
StackLeniency: 0.7
SampleSet: Drum

[Metadata]
Title:Song
Artist:Someone
Creator:Mapper
Version:Hard

[Difficulty]
HPDrainRate:5
CircleSize:4
OverallDifficulty:8
ApproachRate:9
SliderMultiplier:1.4
SliderTickRate:1

[Events]
//Background and Video events
0,0,\"bg.jpg\",0,0
2,3000,4000

[TimingPoints]
0,500,4,2,0,100,1,0
";

    fn header_only(text: &str) -> Result<BeatMap> {
        let mut beatmap = BeatMap::new();
        BeatmapParser::default().parse_header_from(Cursor::new(text), &mut beatmap)?;
        Ok(beatmap)
    }

    fn full(text: &str, config: ParserConfig) -> BeatMap {
        let parser = BeatmapParser::new(config);
        let mut beatmap = BeatMap::new();
        parser
            .parse_header_from(Cursor::new(text), &mut beatmap)
            .unwrap();
        parser
            .parse_objects_from(Cursor::new(text), &mut beatmap)
            .unwrap();
        beatmap
    }

    fn with_objects(lines: &[&str]) -> String {
        format!("{HEADER}\n[HitObjects]\n{}\n", lines.join("\n"))
    }

    #[test]
    fn header_pass_fills_model() {
        let beatmap = header_only(HEADER).unwrap();

        assert_eq!(beatmap.name, "Song");
        assert_eq!(beatmap.audio, "audio.mp3");
        assert_eq!(beatmap.background, "bg.jpg");
        assert_eq!(beatmap.timings.base_set, 3);
        assert_eq!(beatmap.pauses_text, "3000,4000");
        assert_eq!(beatmap.timings.points().len(), 1);
        assert_eq!(beatmap.difficulty.approach_rate(), 9.0);
        assert!(beatmap.hit_objects.is_empty());
    }

    #[test]
    fn non_standard_mode_is_rejected() {
        let text = HEADER.replace("Mode: 0", "Mode: 1");
        let err = header_only(&text).unwrap_err();
        assert!(matches!(err, BeatmapError::UnsupportedMode { .. }));
    }

    #[test]
    fn one_identity_field_is_enough() {
        let text = "[Metadata]\nTitle:Only\n[TimingPoints]\n0,500,4,1,0,100,1,0\n";
        assert!(header_only(text).is_ok());
    }

    #[test]
    fn missing_identity_is_corrupted() {
        let text = "[Metadata]\nVersion:Hard\n[TimingPoints]\n0,500,4,1,0,100,1,0\n";
        let err = header_only(text).unwrap_err();
        assert!(matches!(err, BeatmapError::CorruptedSource { .. }));
    }

    #[test]
    fn missing_timing_points_is_corrupted() {
        let text = "[Metadata]\nTitle:T\nArtist:A\nCreator:C\n[TimingPoints]\n// none\n";
        let err = header_only(text).unwrap_err();
        assert!(matches!(err, BeatmapError::CorruptedSource { .. }));
    }

    #[test]
    fn unknown_sections_and_data_before_headers_are_ignored() {
        let text = "Title:Stray\n[Colours]\nTitle:Wrong\n[[Metadata]]]\nTitle:Right\n[TimingPoints]\n0,500\n";
        let beatmap = header_only(text).unwrap();
        assert_eq!(beatmap.name, "Right");
    }

    #[test]
    fn objects_are_sorted_numbered_and_timed() {
        let text = with_objects(&[
            "300,300,2000,1,0",
            "100,100,1000,5,0",
            "200,200,1500,2,0,L|250:200,1,100",
            "garbage line,",
            "256,192,5000,12,0,6000",
        ]);

        let beatmap = full(&text, ParserConfig::default());
        let objects = &beatmap.hit_objects;

        let times: Vec<i64> = objects.iter().map(|o| o.start_time).collect();
        assert_eq!(times, vec![1000, 1500, 2000, 3000, 5000]);
        assert!(objects[3].is_pause());
        assert!(objects[3].number.is_none());
        assert!(objects[3].combo_set.is_none());

        let numbers: Vec<Option<usize>> = beatmap.playable_objects().map(|o| o.number).collect();
        assert_eq!(numbers, vec![Some(0), Some(1), Some(2), Some(3)]);

        let ObjectKind::Slider(slider) = &objects[1].kind else {
            panic!("expected slider");
        };
        assert!(slider.velocity > 0.0);
        assert_eq!(objects[1].end_time, 1500 + 357);
        assert_eq!(objects[0].sample_set, 2);
    }

    #[test]
    fn combo_numbers_reset_on_new_combo() {
        let text = with_objects(&[
            "10,10,100,1,0",
            "20,20,200,1,0",
            "30,30,300,5,0",
            "40,40,400,1,0",
            "50,50,3500,5,0",
        ]);

        let beatmap = full(&text, ParserConfig::default());
        let combos: Vec<(Option<u32>, Option<u32>)> = beatmap
            .playable_objects()
            .map(|o| (o.combo_set, o.combo_number))
            .collect();

        assert_eq!(
            combos,
            vec![
                (Some(1), Some(1)),
                (Some(1), Some(2)),
                (Some(2), Some(1)),
                (Some(2), Some(2)),
                (Some(3), Some(1)),
            ]
        );
    }

    #[test]
    fn literal_numbering_counts_only_flags() {
        let text = with_objects(&["10,10,100,1,0", "20,20,200,5,0"]);
        let config = ParserConfig {
            combo_numbering: ComboNumbering::Literal,
            ..Default::default()
        };

        let beatmap = full(&text, config);
        let combos: Vec<(Option<u32>, Option<u32>)> = beatmap
            .playable_objects()
            .map(|o| (o.combo_set, o.combo_number))
            .collect();

        assert_eq!(combos, vec![(Some(0), Some(1)), (Some(1), Some(1))]);
    }

    #[test]
    fn flagged_first_object_counts_once() {
        let text = with_objects(&["10,10,100,5,0", "20,20,200,1,0"]);
        let beatmap = full(&text, ParserConfig::default());

        assert_eq!(beatmap.hit_objects[0].combo_set, Some(1));
        assert_eq!(beatmap.hit_objects[1].combo_set, Some(1));
        assert_eq!(beatmap.hit_objects[1].combo_number, Some(2));
    }

    #[test]
    fn stacking_can_be_disabled() {
        let text = with_objects(&["100,100,100,1,0", "100,100,200,1,0"]);

        let stacked = full(&text, ParserConfig::default());
        assert_eq!(stacked.hit_objects[0].stack_index, 1);

        let config = ParserConfig {
            stacking: false,
            ..Default::default()
        };
        let flat = full(&text, config);
        assert_eq!(flat.hit_objects[0].stack_index, 0);
        assert_eq!(flat.hit_objects[0].stack_offset, Vec2::default());
    }

    #[test]
    fn object_pass_requires_header_pass() {
        let mut beatmap = BeatMap::new();
        let err = BeatmapParser::default()
            .parse_objects_from(Cursor::new(HEADER), &mut beatmap)
            .unwrap_err();
        assert!(matches!(err, BeatmapError::Message(_)));
    }

    #[test]
    fn custom_factory_sees_every_object_line() {
        struct CountingFactory;

        impl ObjectFactory for CountingFactory {
            fn build(&self, fields: &[String]) -> Option<HitObject> {
                let time = fields[2].parse().ok()?;
                Some(HitObject::circle(time, Vec2::default(), false))
            }
        }

        let text = with_objects(&["0,0,300,1,0", "// comment", "0,0,100,99,0", "0,0,x,1,0"]);
        let parser = BeatmapParser::default().with_object_factory(CountingFactory);
        let mut beatmap = BeatMap::new();
        parser
            .parse_header_from(Cursor::new(text.as_str()), &mut beatmap)
            .unwrap();
        parser
            .parse_objects_from(Cursor::new(text.as_str()), &mut beatmap)
            .unwrap();

        assert_eq!(beatmap.playable_objects().count(), 2);
    }

    #[test]
    fn custom_loader_runs_once_and_unlocks_object_pass() {
        use std::cell::Cell;
        use std::rc::Rc;

        use crate::timing::Timings;

        struct RecordingLoader(Rc<Cell<usize>>);

        impl TimingLoader for RecordingLoader {
            fn load(&self, raw: &str, timings: &mut Timings) {
                assert!(raw.contains("0,500"));
                timings.tick_rate = 4.0;
                self.0.set(self.0.get() + 1);
            }
        }

        let calls = Rc::new(Cell::new(0));
        let parser = BeatmapParser::default().with_timing_loader(RecordingLoader(calls.clone()));
        let text = with_objects(&["10,10,100,1,0"]);
        let mut beatmap = BeatMap::new();

        parser
            .parse_header_from(Cursor::new(text.as_str()), &mut beatmap)
            .unwrap();
        parser
            .parse_objects_from(Cursor::new(text.as_str()), &mut beatmap)
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(beatmap.timings.tick_rate, 4.0);
        assert!(beatmap.timings.points().is_empty());
        assert_eq!(beatmap.playable_objects().count(), 1);
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let mut text = HEADER.as_bytes().to_vec();
        text.extend_from_slice(b"\n[Metadata]\nTags:caf\xE9\n");
        let mut beatmap = BeatMap::new();

        BeatmapParser::default()
            .parse_header_from(Cursor::new(text), &mut beatmap)
            .unwrap();

        assert_eq!(beatmap.tags, "caf\u{FFFD}");
    }

    #[test]
    fn extreme_object_values_never_abort_the_pass() {
        let text = with_objects(&[
            "0,0,1000,2,0,L|1:1,1,1e300",
            "0,0,-1e30,1,0",
            "0,0,1e30,1,0",
            "0,0,2000,1,0",
        ]);

        let beatmap = full(&text, ParserConfig::default());
        let times: Vec<i64> = beatmap.playable_objects().map(|o| o.start_time).collect();

        assert_eq!(times, vec![1000, 2000]);
        assert_eq!(beatmap.hit_objects[0].end_time, i64::MAX);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let err = BeatmapParser::default()
            .open("/definitely/not/here.osu")
            .unwrap_err();
        assert!(matches!(err, BeatmapError::SourceUnavailable { .. }));
        assert!(!err.is_parse_failure());
    }
}
