use std::fs;

use beatmap_core::{BeatMap, BeatmapError, BeatmapParser, ObjectKind, ParserConfig};

const MAP: &str = "osu file format v14\r
\r
[General]\r
AudioFilename: song.mp3\r
Mode: 0\r
\r
[Metadata]\r
Title:Integration\r
Artist:Tester\r
Creator:Mapper\r
Version:Normal\r
\r
[Difficulty]\r
CircleSize:4\r
ApproachRate:8\r
SliderMultiplier:1\r
SliderTickRate:1\r
\r
[Events]\r
0,0,\"bg.png\",0,0\r
2,2500,3500\r
\r
[TimingPoints]\r
0,500,4,1,0,100,1,0\r
2000,-50,4,1,0,100,0,0\r
\r
[HitObjects]\r
64,64,2100,2,0,L|164:64,1,100\r
32,32,1000,5,0\r
256,192,4000,12,0,5000\r
";

#[test]
fn header_then_objects_from_songs_dir() {
    let songs = tempfile::tempdir().unwrap();
    let set = songs.path().join("1 Tester - Integration");
    fs::create_dir(&set).unwrap();
    fs::write(set.join("map.osu"), MAP).unwrap();

    let config = ParserConfig {
        songs_dir: Some(songs.path().to_path_buf()),
        ..Default::default()
    };
    let parser = BeatmapParser::new(config);

    let mut beatmap = parser.open("1 Tester - Integration/map.osu").unwrap();
    assert_eq!(beatmap.dir, "1 Tester - Integration");
    assert_eq!(beatmap.file, "map.osu");
    assert_eq!(beatmap.audio, "song.mp3");
    assert_eq!(beatmap.background, "bg.png");
    assert_eq!(beatmap.timings.points().len(), 2);
    assert!(beatmap.hit_objects.is_empty());

    parser.parse_objects(&mut beatmap).unwrap();

    let times: Vec<i64> = beatmap.hit_objects.iter().map(|o| o.start_time).collect();
    assert_eq!(times, vec![1000, 2100, 2500, 4000]);

    let ObjectKind::Slider(slider) = &beatmap.hit_objects[1].kind else {
        panic!("expected slider at 2100");
    };
    // Inherited point at 2000 halves the beat length.
    assert_eq!(slider.span_duration, 250.0);
    assert_eq!(beatmap.hit_objects[1].end_time, 2350);
    assert!(beatmap.hit_objects[2].is_pause());
}

#[test]
fn locate_uses_folder_and_file_names() {
    let songs = tempfile::tempdir().unwrap();
    fs::create_dir(songs.path().join("set")).unwrap();
    fs::write(songs.path().join("set/map.osu"), MAP).unwrap();

    let parser = BeatmapParser::default();
    let mut beatmap = BeatMap::locate(songs.path(), "set", "map.osu");
    parser.parse_header(&mut beatmap).unwrap();
    parser.parse_objects(&mut beatmap).unwrap();

    assert_eq!(beatmap.playable_objects().count(), 3);
}

#[test]
fn corrupted_file_is_reported_with_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.osu");
    fs::write(&path, "[General]\nMode: 0\n").unwrap();

    let err = BeatmapParser::default().load(&path).unwrap_err();
    match err {
        BeatmapError::CorruptedSource { path: reported } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other}"),
    }
}
