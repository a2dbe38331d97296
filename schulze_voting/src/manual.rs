/*!

This is the long-form manual for `schulze_voting` and `condorcli`.

## Ballot format

The input is a text file with one ballot per line. The candidates are listed
from the most preferred to the least preferred, separated by commas.
Candidates that are equally preferred are joined with `=`:

```text
Tom,Sally=Dan,Bob
Bob,Tom
```

In the first ballot, `Tom` is preferred to `Sally` and `Dan`, who are tied,
and `Bob` comes last. In the second ballot, `Sally` and `Dan` are not ranked:
a candidate that is missing from a ballot is considered less preferred than all
the candidates of this ballot.

Both the commas and the equal signs follow the CSV quoting rules. A name that
contains a comma must be quoted (`"Smith, John",Doe`). To keep an equal sign
in a name, the quotes must survive the first split on commas, so they are
doubled: `"""a=b""",c`.

Rules for each line:
- empty lines, and lines that only contain empty ranks, are skipped
- an empty rank (`A,,B`) does not count as a rank: `B` is second
- a candidate may only appear once in a ballot. Otherwise the whole line is
  rejected with the error `cyclic vote detected`.
- when a normalizer refuses a name, the whole line is rejected too.
- a quoted name must be closed on the same line (`"Smith, John` is rejected).
- a line that is not valid UTF-8 is rejected.

Rejected lines are reported with their line number (starting at 1) and do not
prevent the other ballots from being counted.

## Candidate names

With the default normalizer, the names are trimmed and upper-cased: `" Bob"`,
`"bob"` and `"BOB "` are the same candidate `BOB`. It also records the list of
all the candidates that it has seen.

When a list of candidates is known in advance, `RegisteredCandidates` only
accepts those names and rejects the ballots that mention another one.

## Ranking

The ranking follows the Schulze method:
1. for each pair of candidates `X` and `Y`, count the ballots that prefer `X` to `Y`
2. compute the strength of the strongest path from each candidate to each other
   candidate, where a path only uses pairs won by a majority
3. the score of a candidate is the number of candidates it beats through the
   strongest paths. Candidates are sorted by decreasing score.

Candidates with the same score are sorted by name. This means that the ranking
is always the same for the same ballots.

Note that the ranking by score is simpler than the elimination of the Schwartz
sets. Both give the same winner when there is a single one, but they may differ
further down the ranking for some elections with cycles.

## Command line

`condorcli` reads the ballots from the standard input (or the file given with
`--input`), prints the rejected lines on the standard error, and prints the
ranking with one candidate per line:

```bash
condorcli --input ballots.txt
```

```text
ERROR [Line 12]: cyclic vote detected: cannot reference candidate A twice in a vote
E
A
C
B
D
```

The other options:
- `--out <file or stdout>`: writes a summary of the election in JSON. With
  `stdout`, the summary is printed instead of the ranking.
- `--reference <file>`: compares the summary with a reference summary and fails
  if they differ
- `--config <file>`: reads the options from a configuration file
- `--verbose`: prints the details of the computation

## Configuration

The configuration file is a JSON file. All the fields are optional.

```json
{
  "contestName": "Board election",
  "candidates": ["Alice", "Bob", "Carol"],
  "input": "ballots.txt",
  "out": "summary.json"
}
```

When `candidates` is provided, ballots mentioning another candidate are
rejected. The relative paths are resolved from the directory of the
configuration file. The options passed on the command line take precedence
over the configuration file.

 */
